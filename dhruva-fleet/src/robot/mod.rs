//! Simulated robots travelling the navigation graph.
//!
//! - [`RobotStatus`]: the five lifecycle states
//! - [`Robot`]: per-tick state machine (motion, battery, charging)
//! - [`RobotSnapshot`]: serializable view for hosts and UIs

mod snapshot;
mod state_machine;
mod status;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use snapshot::RobotSnapshot;
pub use state_machine::{ARRIVAL_EPSILON, Robot, TaskPlan};
pub use status::RobotStatus;

/// Fleet-unique robot identifier.
///
/// Allocated by the coordinator starting at 1 and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(pub u32);

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
