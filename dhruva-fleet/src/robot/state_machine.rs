//! Per-robot state machine.
//!
//! The coordinator calls [`Robot::step`] once per tick. What happens depends
//! on the current [`RobotStatus`]:
//!
//! - `Moving`: advance along the committed lane, arrive, drain the battery
//!   and divert to a charger when it runs low
//! - `Waiting`: retry the move; the coordinator reverts it if still blocked
//! - `Charging`: recharge until the battery is nearly full
//! - `Idle` / `TaskComplete`: nothing
//!
//! The coordinator owns arbitration. It snapshots every robot before the
//! tick and calls [`Robot::restore_waiting`] on the losers.

use std::collections::VecDeque;

use crate::config::RobotConfig;
use crate::fleet::EventKind;
use crate::graph::{DirectedLane, LaneKey, NavGraph, VertexIdx};
use crate::utils::WorldPoint;

use super::{RobotId, RobotStatus};

/// Tolerance on lane progress so that `n * speed` reaches 1.0 despite
/// floating-point error.
pub const ARRIVAL_EPSILON: f32 = 1e-4;

/// A route computed for a robot but not yet applied to it.
///
/// Produced by [`Robot::plan_task`] so that callers can reserve the route
/// before committing it with [`Robot::commit_plan`].
#[derive(Clone, Debug, PartialEq)]
pub struct TaskPlan {
    destination: VertexIdx,
    /// Anchor vertex to destination, inclusive
    route: Vec<VertexIdx>,
    /// Lane kept when the robot is already part-way along it
    in_flight: Option<DirectedLane>,
}

impl TaskPlan {
    pub fn destination(&self) -> VertexIdx {
        self.destination
    }

    /// Route from the anchor vertex (current vertex, or far end of the lane
    /// in flight) to the destination.
    pub fn route(&self) -> &[VertexIdx] {
        &self.route
    }

    pub fn keeps_lane(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Every vertex the robot will cover, starting with the tail of a lane
    /// kept in flight.
    pub fn full_route(&self) -> Vec<VertexIdx> {
        let mut full = Vec::with_capacity(self.route.len() + 1);
        if let Some(lane) = self.in_flight {
            full.push(lane.from);
        }
        full.extend_from_slice(&self.route);
        full
    }
}

/// A simulated robot.
#[derive(Clone, Debug)]
pub struct Robot {
    id: RobotId,
    config: RobotConfig,
    status: RobotStatus,
    /// None once detached from the graph
    position: Option<WorldPoint>,
    /// Last vertex reached (the tail of the current lane while travelling)
    current_vertex: Option<VertexIdx>,
    destination: Option<VertexIdx>,
    /// Vertices still to visit after the current lane, head = next hop
    path: VecDeque<VertexIdx>,
    current_lane: Option<DirectedLane>,
    /// Fraction of `current_lane` covered, in [0, 1)
    progress: f32,
    battery: f32,
    /// Consecutive ticks spent waiting
    wait_ticks: u32,
    /// A failed charger reroute has been reported for this low-battery episode
    reroute_failure_reported: bool,
    events: Vec<EventKind>,
}

impl Robot {
    /// Place a new idle robot on `vertex`.
    pub fn new(id: RobotId, vertex: VertexIdx, position: WorldPoint, config: RobotConfig) -> Self {
        let battery = config.initial_battery.clamp(0.0, 100.0);
        Self {
            id,
            config,
            status: RobotStatus::Idle,
            position: Some(position),
            current_vertex: Some(vertex),
            destination: None,
            path: VecDeque::new(),
            current_lane: None,
            progress: 0.0,
            battery,
            wait_ticks: 0,
            reroute_failure_reported: false,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn status(&self) -> RobotStatus {
        self.status
    }

    pub fn position(&self) -> Option<WorldPoint> {
        self.position
    }

    pub fn current_vertex(&self) -> Option<VertexIdx> {
        self.current_vertex
    }

    pub fn destination(&self) -> Option<VertexIdx> {
        self.destination
    }

    /// Vertices still to visit after the current lane.
    pub fn path(&self) -> &VecDeque<VertexIdx> {
        &self.path
    }

    pub fn current_lane(&self) -> Option<DirectedLane> {
        self.current_lane
    }

    pub fn lane_key(&self) -> Option<LaneKey> {
        self.current_lane.map(|lane| lane.key())
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn battery(&self) -> f32 {
        self.battery
    }

    pub fn wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Events logged since the last [`Robot::drain_events`].
    pub fn pending_events(&self) -> &[EventKind] {
        &self.events
    }

    /// Remaining route: tail of the current lane (or the current vertex),
    /// then every vertex still to visit.
    pub fn planned_route(&self) -> Vec<VertexIdx> {
        let mut route = Vec::with_capacity(self.path.len() + 2);
        match self.current_lane {
            Some(lane) => {
                route.push(lane.from);
                route.push(lane.to);
            }
            None => route.extend(self.current_vertex),
        }
        route.extend(self.path.iter().copied());
        route
    }

    /// Plan and commit a task in one go.
    ///
    /// Returns false, leaving the robot untouched, when it is charging, has
    /// no position, or no path to `destination` exists.
    pub fn assign_task(&mut self, destination: VertexIdx, graph: &NavGraph) -> bool {
        match self.plan_task(destination, graph) {
            Some(plan) => {
                self.commit_plan(plan);
                true
            }
            None => false,
        }
    }

    /// Compute the route a task to `destination` would take.
    ///
    /// A robot part-way along a lane plans from the lane's far end and keeps
    /// the lane, so it never jumps back to the vertex it left.
    pub fn plan_task(&self, destination: VertexIdx, graph: &NavGraph) -> Option<TaskPlan> {
        if self.status == RobotStatus::Charging {
            tracing::debug!(
                "Robot {} is charging, task to vertex {} rejected",
                self.id,
                destination
            );
            return None;
        }

        let in_flight = self.current_lane.filter(|_| self.progress > 0.0);
        let anchor = match in_flight {
            Some(lane) => lane.to,
            None => self.current_vertex?,
        };

        let route = graph.shortest_path(anchor, destination);
        if route.is_empty() {
            tracing::debug!(
                "Robot {}: no path from vertex {} to vertex {}",
                self.id,
                anchor,
                destination
            );
            return None;
        }

        Some(TaskPlan {
            destination,
            route,
            in_flight,
        })
    }

    /// Apply a plan produced by [`Robot::plan_task`] for this robot.
    pub fn commit_plan(&mut self, plan: TaskPlan) {
        self.events.push(EventKind::TaskAssigned {
            destination: plan.destination,
        });
        self.wait_ticks = 0;
        self.apply_plan(plan);
    }

    /// Advance one tick.
    pub fn step(&mut self, graph: &NavGraph) {
        match self.status {
            RobotStatus::Charging => self.charge(),
            RobotStatus::Moving => self.advance(graph),
            RobotStatus::Waiting => {
                // Tentative; the coordinator reverts it if still blocked
                self.status = RobotStatus::Moving;
                self.advance(graph);
            }
            RobotStatus::Idle | RobotStatus::TaskComplete => {}
        }
    }

    /// Roll back to the pre-tick state `before` and hold position.
    pub(crate) fn restore_waiting(&mut self, before: &Robot) {
        *self = before.clone();
        self.status = RobotStatus::Waiting;
    }

    /// Update the wait counter after arbitration and abandon the task once
    /// the robot has waited `wait_timeout_ticks` in a row.
    pub(crate) fn settle_wait(&mut self, graph: &NavGraph) {
        if self.status != RobotStatus::Waiting {
            if self.wait_ticks > 0 {
                self.events.push(EventKind::Resumed {
                    waited_ticks: self.wait_ticks,
                });
                self.wait_ticks = 0;
            }
            return;
        }

        self.wait_ticks += 1;
        if self.wait_ticks == 1
            && let Some(lane) = self.lane_key()
        {
            self.events.push(EventKind::Waiting { lane });
        }

        if self.wait_ticks >= self.config.wait_timeout_ticks {
            self.abandon(graph);
        }
    }

    /// Take the robot off the graph because `missing` no longer exists.
    pub(crate) fn detach(&mut self, missing: VertexIdx) {
        tracing::warn!(
            "Robot {} references vertex {} outside the loaded level, detaching",
            self.id,
            missing
        );
        self.status = RobotStatus::Idle;
        self.position = None;
        self.current_vertex = None;
        self.clear_task();
        self.wait_ticks = 0;
        self.events.push(EventKind::Detached { vertex: missing });
    }

    /// Take every event logged since the last drain.
    pub fn drain_events(&mut self) -> Vec<EventKind> {
        std::mem::take(&mut self.events)
    }

    fn apply_plan(&mut self, plan: TaskPlan) {
        let TaskPlan {
            destination,
            route,
            in_flight,
        } = plan;

        self.destination = Some(destination);
        self.path = route.into_iter().skip(1).collect();

        if let Some(lane) = in_flight {
            self.current_lane = Some(lane);
            self.status = RobotStatus::Moving;
            return;
        }

        self.current_lane = None;
        self.progress = 0.0;
        if self.path.is_empty() {
            if let Some(vertex) = self.current_vertex {
                self.complete_task(vertex);
            }
        } else {
            self.status = RobotStatus::Moving;
            self.commit_next_hop();
        }
    }

    /// Pop the next hop and start traversing the lane towards it.
    fn commit_next_hop(&mut self) {
        match (self.current_vertex, self.path.pop_front()) {
            (Some(from), Some(next)) => {
                self.current_lane = Some(DirectedLane::new(from, next));
                self.progress = 0.0;
            }
            _ => self.current_lane = None,
        }
    }

    fn advance(&mut self, graph: &NavGraph) {
        let Some(lane) = self.current_lane else {
            self.status = RobotStatus::Idle;
            return;
        };

        let (from, to) = match (graph.vertex(lane.from), graph.vertex(lane.to)) {
            (Some(from), Some(to)) => (from.position, to.position),
            (None, _) => return self.detach(lane.from),
            (_, None) => return self.detach(lane.to),
        };

        self.progress += self.config.speed;
        if self.progress + ARRIVAL_EPSILON < 1.0 {
            self.position = Some(from.lerp(to, self.progress));
        } else {
            self.arrive(lane.to, to, graph);
        }

        if self.status == RobotStatus::Moving {
            self.battery = (self.battery - self.config.battery_drain_per_tick).max(0.0);
            if self.battery < self.config.low_battery_threshold {
                self.seek_charger(graph);
            }
        }
    }

    fn arrive(&mut self, vertex: VertexIdx, position: WorldPoint, graph: &NavGraph) {
        self.position = Some(position);
        self.current_vertex = Some(vertex);
        self.current_lane = None;
        self.progress = 0.0;

        if graph.is_charger(vertex) && self.battery < self.config.charge_seek_threshold {
            self.status = RobotStatus::Charging;
            self.clear_task();
            self.events.push(EventKind::ChargingStarted { vertex });
        } else if self.path.is_empty() {
            self.complete_task(vertex);
        } else {
            self.commit_next_hop();
        }
    }

    fn complete_task(&mut self, vertex: VertexIdx) {
        self.status = RobotStatus::TaskComplete;
        self.clear_task();
        self.events.push(EventKind::TaskCompleted { vertex });
    }

    /// Divert to the charger closest in a straight line.
    fn seek_charger(&mut self, graph: &NavGraph) {
        if self.destination.is_some_and(|d| graph.is_charger(d)) {
            return;
        }

        let plan = self
            .position
            .and_then(|p| graph.nearest_charger(p))
            .and_then(|charger| self.plan_task(charger, graph));

        match plan {
            Some(plan) => {
                tracing::info!(
                    "Robot {} battery at {:.1}%, heading to charger at vertex {}",
                    self.id,
                    self.battery,
                    plan.destination
                );
                self.events.push(EventKind::LowBatteryReroute {
                    charger: plan.destination,
                });
                self.apply_plan(plan);
                self.reroute_failure_reported = false;
            }
            None if !self.reroute_failure_reported => {
                tracing::warn!(
                    "Robot {} battery at {:.1}% and no charger is reachable",
                    self.id,
                    self.battery
                );
                self.events.push(EventKind::RerouteFailed);
                self.reroute_failure_reported = true;
            }
            None => {}
        }
    }

    fn charge(&mut self) {
        self.battery = (self.battery + self.config.charge_rate_per_tick).min(100.0);
        if self.battery >= self.config.charge_complete_threshold {
            self.status = RobotStatus::Idle;
            self.reroute_failure_reported = false;
            self.events.push(EventKind::ChargingFinished {
                battery: self.battery,
            });
        }
    }

    fn abandon(&mut self, graph: &NavGraph) {
        let waited_ticks = self.wait_ticks;
        tracing::info!(
            "Robot {} waited {} ticks, abandoning task to {:?}",
            self.id,
            waited_ticks,
            self.destination
        );

        self.status = RobotStatus::Idle;
        self.clear_task();
        self.wait_ticks = 0;
        if let Some(vertex) = self.current_vertex.and_then(|v| graph.vertex(v)) {
            self.position = Some(vertex.position);
        }
        self.events.push(EventKind::WaitTimedOut {
            vertex: self.current_vertex,
            waited_ticks,
        });
    }

    fn clear_task(&mut self) {
        self.destination = None;
        self.path.clear();
        self.current_lane = None;
        self.progress = 0.0;
    }
}
