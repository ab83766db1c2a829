//! Fleet coordinator.
//!
//! Owns the navigation graph and every robot, advances them one tick at a
//! time and resolves conflicts between them:
//!
//! - A non-charger vertex holds at most one robot. A robot already on the
//!   vertex keeps it; otherwise the lowest id among the arrivals wins.
//! - A lane holds at most one robot. The lowest id on the lane keeps it.
//!
//! Losers are rolled back to their pre-tick state and set to WAITING.
//! Rolling a robot back can create a new conflict, so arbitration repeats
//! until nothing changes.

use std::collections::{BTreeMap, HashMap};

use crate::config::{FleetConfig, RobotConfig};
use crate::error::{FleetError, Result};
use crate::graph::{LaneKey, NavGraph, VertexIdx};
use crate::robot::{Robot, RobotId, RobotSnapshot, RobotStatus};
use crate::traffic::TrafficReservation;
use crate::utils::unix_millis;

use super::events::{EventKind, FleetEvent};
use super::occupancy::OccupancyTable;

/// Owns the robots and runs the simulation tick.
pub struct FleetCoordinator {
    graph: NavGraph,
    robot_config: RobotConfig,
    strict_reservations: bool,
    /// Sorted by id
    robots: Vec<Robot>,
    next_id: u32,
    occupancy: OccupancyTable,
    traffic: TrafficReservation,
    /// Route reserved per robot when strict reservations are on
    reserved: HashMap<RobotId, Vec<VertexIdx>>,
    /// Events raised outside a tick, emitted ahead of the next tick's
    pending: Vec<(Option<RobotId>, EventKind)>,
    tick: u64,
}

impl FleetCoordinator {
    pub fn new(graph: NavGraph, config: &FleetConfig) -> Self {
        let occupancy = OccupancyTable::new(graph.vertex_count());
        Self {
            graph,
            robot_config: config.robot.clone(),
            strict_reservations: config.traffic.strict_reservations,
            robots: Vec::new(),
            next_id: 1,
            occupancy,
            traffic: TrafficReservation::new(),
            reserved: HashMap::new(),
            pending: Vec::new(),
            tick: 0,
        }
    }

    /// Place a new robot on `vertex` and return its id.
    pub fn spawn(&mut self, vertex: VertexIdx) -> Result<RobotId> {
        let (position, name, is_charger) = match self.graph.vertex(vertex) {
            Some(v) => (v.position, v.label().to_string(), v.is_charger),
            None => return Err(FleetError::InvalidVertex(vertex)),
        };
        if !is_charger && !self.occupancy.occupants(vertex).is_empty() {
            return Err(FleetError::VertexOccupied(vertex));
        }

        let id = RobotId(self.next_id);
        self.next_id += 1;
        self.robots
            .push(Robot::new(id, vertex, position, self.robot_config.clone()));
        self.occupancy.occupy_vertex(vertex, id);

        tracing::info!("Spawned robot {} at vertex {}", id, vertex);
        self.pending
            .push((Some(id), EventKind::Spawned { vertex, name }));
        Ok(id)
    }

    /// Send `robot` to `destination`.
    ///
    /// `Ok(false)` means the robot declined: it is charging, no path exists,
    /// or (with strict reservations) the route could not be reserved.
    pub fn assign_task(&mut self, robot: RobotId, destination: VertexIdx) -> Result<bool> {
        let idx = self
            .robot_index(robot)
            .ok_or(FleetError::RobotNotFound(robot))?;
        if self.robots[idx].current_vertex().is_none() {
            return Err(FleetError::RobotUnpositioned(robot));
        }
        if !self.graph.contains(destination) {
            return Err(FleetError::InvalidDestination(destination));
        }
        if !self.graph.is_charger(destination)
            && self
                .occupancy
                .occupants(destination)
                .iter()
                .any(|&other| other != robot)
        {
            return Err(FleetError::DestinationOccupied(destination));
        }

        let Some(plan) = self.robots[idx].plan_task(destination, &self.graph) else {
            tracing::info!("Robot {} cannot take a task to vertex {}", robot, destination);
            return Ok(false);
        };

        if self.strict_reservations && !self.reserve(robot, plan.full_route()) {
            return Ok(false);
        }

        self.robots[idx].commit_plan(plan);
        if self.strict_reservations {
            self.sync_reservation(idx);
        }
        Ok(true)
    }

    /// Advance every robot by one tick and return the events produced.
    pub fn tick(&mut self) -> Vec<FleetEvent> {
        self.tick += 1;
        let timestamp_ms = unix_millis();
        self.occupancy.reset(self.graph.vertex_count());

        let before = self.robots.clone();
        for robot in &mut self.robots {
            match robot.current_vertex() {
                Some(vertex) if !self.graph.contains(vertex) => robot.detach(vertex),
                Some(_) => robot.step(&self.graph),
                None => {}
            }
        }

        self.arbitrate(&before);

        for robot in &mut self.robots {
            robot.settle_wait(&self.graph);
        }
        if self.strict_reservations {
            for idx in 0..self.robots.len() {
                self.sync_reservation(idx);
            }
        }

        self.register_occupancy();
        self.collect_events(timestamp_ms)
    }

    /// Switch the graph to level `name` and remove every robot.
    ///
    /// Robot ids keep counting from where they were. On error nothing
    /// changes.
    pub fn load_level(&mut self, name: &str) -> Result<()> {
        self.graph.load_level(name)?;

        let removed = self.robots.len();
        self.robots.clear();
        self.reserved.clear();
        self.traffic.clear();
        self.occupancy.reset(self.graph.vertex_count());

        tracing::info!("Fleet reset for level '{}', {} robots removed", name, removed);
        self.pending.push((
            None,
            EventKind::LevelLoaded {
                level: name.to_string(),
                vertices: self.graph.vertex_count(),
                lanes: self.graph.lane_count(),
            },
        ));
        Ok(())
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robot_index(id).map(|idx| &self.robots[idx])
    }

    /// All robots in ascending id order.
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn snapshot(&self, id: RobotId) -> Option<RobotSnapshot> {
        self.robot(id).map(RobotSnapshot::from)
    }

    pub fn snapshots(&self) -> Vec<RobotSnapshot> {
        self.robots.iter().map(RobotSnapshot::from).collect()
    }

    /// Robots on `vertex` as of the last tick, spawn or level load.
    pub fn occupants(&self, vertex: VertexIdx) -> &[RobotId] {
        self.occupancy.occupants(vertex)
    }

    pub fn lane_holder(&self, lane: LaneKey) -> Option<RobotId> {
        self.occupancy.lane_holder(lane)
    }

    pub fn occupancy(&self) -> &OccupancyTable {
        &self.occupancy
    }

    pub fn traffic(&self) -> &TrafficReservation {
        &self.traffic
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// True when no robot is moving, waiting or charging.
    pub fn is_idle(&self) -> bool {
        self.robots.iter().all(|r| r.status().is_at_rest())
    }

    fn robot_index(&self, id: RobotId) -> Option<usize> {
        self.robots.binary_search_by_key(&id, Robot::id).ok()
    }

    fn arbitrate(&mut self, before: &[Robot]) {
        let mut reverted = vec![false; self.robots.len()];

        loop {
            let mut changed = false;

            let mut by_vertex: BTreeMap<VertexIdx, Vec<usize>> = BTreeMap::new();
            for (idx, robot) in self.robots.iter().enumerate() {
                if let Some(vertex) = robot.current_vertex()
                    && !self.graph.is_charger(vertex)
                {
                    by_vertex.entry(vertex).or_default().push(idx);
                }
            }

            for (vertex, contenders) in by_vertex {
                if contenders.len() < 2 {
                    continue;
                }
                // A robot that did not arrive this tick keeps the vertex
                let winner = contenders
                    .iter()
                    .copied()
                    .find(|&idx| reverted[idx] || before[idx].current_vertex() == Some(vertex))
                    .unwrap_or(contenders[0]);

                for idx in contenders {
                    if idx != winner && !reverted[idx] {
                        self.hold(idx, &before[idx], &mut reverted);
                        changed = true;
                    }
                }
            }

            let mut holders: HashMap<LaneKey, usize> = HashMap::new();
            for idx in 0..self.robots.len() {
                let status = self.robots[idx].status();
                let Some(lane) = self.robots[idx].lane_key() else {
                    continue;
                };
                if !status.is_travelling() {
                    continue;
                }
                if holders.contains_key(&lane) {
                    if status == RobotStatus::Moving {
                        self.hold(idx, &before[idx], &mut reverted);
                        changed = true;
                    }
                } else {
                    holders.insert(lane, idx);
                }
            }

            if !changed {
                break;
            }
        }
    }

    fn hold(&mut self, idx: usize, before: &Robot, reverted: &mut [bool]) {
        tracing::debug!("Robot {} blocked, holding position", before.id());
        self.robots[idx].restore_waiting(before);
        reverted[idx] = true;
    }

    fn register_occupancy(&mut self) {
        for robot in &self.robots {
            if let Some(vertex) = robot.current_vertex() {
                self.occupancy.occupy_vertex(vertex, robot.id());
            }
            if robot.status().is_travelling()
                && let Some(lane) = robot.lane_key()
            {
                self.occupancy.claim_lane(lane, robot.id());
            }
        }
    }

    fn collect_events(&mut self, timestamp_ms: u64) -> Vec<FleetEvent> {
        let tick = self.tick;
        let mut events: Vec<FleetEvent> = self
            .pending
            .drain(..)
            .map(|(robot, kind)| FleetEvent::new(tick, timestamp_ms, robot, kind))
            .collect();

        for robot in &mut self.robots {
            let id = robot.id();
            events.extend(
                robot
                    .drain_events()
                    .into_iter()
                    .map(|kind| FleetEvent::new(tick, timestamp_ms, Some(id), kind)),
            );
        }
        events
    }

    /// Swap `robot`'s reservation for `route`, keeping the old one if the
    /// new route is rejected.
    fn reserve(&mut self, robot: RobotId, route: Vec<VertexIdx>) -> bool {
        let previous = self.reserved.remove(&robot);
        if let Some(old) = &previous {
            self.traffic.release_path(robot, old);
        }

        match self.traffic.request_path(robot, &route) {
            Ok(()) => {
                self.reserved.insert(robot, route);
                true
            }
            Err(e) => {
                tracing::info!("Robot {} route not reserved: {}", robot, e);
                if let Some(old) = previous
                    && self.traffic.request_path(robot, &old).is_ok()
                {
                    self.reserved.insert(robot, old);
                }
                false
            }
        }
    }

    fn release(&mut self, robot: RobotId) {
        if let Some(route) = self.reserved.remove(&robot) {
            self.traffic.release_path(robot, &route);
        }
    }

    /// Release a finished robot's reservation, or follow a reroute.
    fn sync_reservation(&mut self, idx: usize) {
        let robot = &self.robots[idx];
        let id = robot.id();
        let Some(reserved_for) = self.reserved.get(&id).and_then(|r| r.last().copied()) else {
            return;
        };

        match robot.destination() {
            None => self.release(id),
            Some(destination) if destination != reserved_for => {
                let route = robot.planned_route();
                self.release(id);
                match self.traffic.request_path(id, &route) {
                    Ok(()) => {
                        self.reserved.insert(id, route);
                    }
                    Err(e) => tracing::warn!(
                        "Robot {} heading to vertex {} without a reservation: {}",
                        id,
                        destination,
                        e
                    ),
                }
            }
            Some(_) => {}
        }
    }
}
