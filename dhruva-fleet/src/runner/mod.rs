//! Host loop: scenario playback, fixed-period ticking and event output.

mod sink;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::{FleetConfig, SimulationConfig, TaskSpec};
use crate::error::Result;
use crate::fleet::{FleetCoordinator, FleetEvent};
use crate::graph::{NavGraph, NavGraphDocument};
use crate::robot::{RobotId, RobotStatus};

pub use sink::{EventSink, FileSink, MemorySink, TracingSink};

/// Drives a [`FleetCoordinator`] from a [`FleetConfig`].
pub struct FleetRunner {
    coordinator: FleetCoordinator,
    simulation: SimulationConfig,
    snapshot_path: Option<PathBuf>,
    /// Scenario tasks not yet dispatched, in `at_tick` order
    tasks: Vec<TaskSpec>,
    sinks: Vec<Box<dyn EventSink>>,
    last_status_time: Instant,
    status_interval: Duration,
}

impl FleetRunner {
    /// Wrap `coordinator`, spawn the scenario robots and queue its tasks.
    pub fn new(mut coordinator: FleetCoordinator, config: &FleetConfig) -> Result<Self> {
        for spawn in &config.scenario.spawn {
            let vertex = spawn.vertex.resolve(coordinator.graph())?;
            coordinator.spawn(vertex)?;
        }

        let status_interval = config.simulation.status_interval()?;
        let mut tasks = config.scenario.task.clone();
        tasks.sort_by_key(|t| t.at_tick);

        Ok(Self {
            coordinator,
            simulation: config.simulation.clone(),
            snapshot_path: config.output.snapshot_path.clone(),
            tasks,
            sinks: Vec::new(),
            last_status_time: Instant::now(),
            status_interval,
        })
    }

    /// Load the graph named by the config and attach the configured sinks.
    pub fn from_config(config: &FleetConfig) -> Result<Self> {
        let mut document = NavGraphDocument::load(&config.graph.path)?;
        for path in &config.graph.extra_paths {
            document = document.merge(NavGraphDocument::load(path)?);
        }
        let graph = NavGraph::with_level(document, &config.graph.level)?;

        let mut runner = Self::new(FleetCoordinator::new(graph, config), config)?;
        runner.add_sink(Box::new(TracingSink));
        if let Some(path) = &config.output.event_log_path {
            runner.add_sink(Box::new(FileSink::create(path)?));
            tracing::info!("Writing fleet events to {:?}", path);
        }
        Ok(runner)
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn coordinator(&self) -> &FleetCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut FleetCoordinator {
        &mut self.coordinator
    }

    /// Scenario tasks still waiting for their tick.
    pub fn pending_tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Dispatch due tasks, run one tick and forward its events to the sinks.
    pub fn step(&mut self) -> Result<Vec<FleetEvent>> {
        self.dispatch_due_tasks();
        let events = self.coordinator.tick();
        for event in &events {
            for sink in &mut self.sinks {
                sink.record(event)?;
            }
        }
        Ok(events)
    }

    /// Run `ticks` ticks back to back, without sleeping.
    pub fn run_ticks(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Tick at the configured period until a stop condition is met or
    /// `running` is cleared, then [`finish`](Self::finish).
    ///
    /// Returns the number of ticks run.
    pub fn run(&mut self, running: &AtomicBool) -> Result<u64> {
        let loop_interval = Duration::from_millis(self.simulation.tick_interval_ms);
        tracing::info!(
            "Fleet simulation started: {} robots, {} ms per tick",
            self.coordinator.robots().len(),
            self.simulation.tick_interval_ms
        );

        while running.load(Ordering::SeqCst) {
            let loop_start = Instant::now();

            self.step()?;

            if self.last_status_time.elapsed() >= self.status_interval {
                self.log_status();
                self.last_status_time = Instant::now();
            }

            if self.should_stop() {
                break;
            }

            let elapsed = loop_start.elapsed();
            if elapsed < loop_interval {
                std::thread::sleep(loop_interval - elapsed);
            }
        }

        self.log_status();
        self.finish()?;
        Ok(self.coordinator.tick_count())
    }

    /// Whether the configured tick limit or idle condition has been reached.
    pub fn should_stop(&self) -> bool {
        let ticks = self.coordinator.tick_count();
        if self.simulation.max_ticks > 0 && ticks >= self.simulation.max_ticks {
            tracing::info!("Reached tick limit {}", self.simulation.max_ticks);
            return true;
        }
        if self.simulation.stop_when_idle
            && ticks > 0
            && self.tasks.is_empty()
            && self.coordinator.is_idle()
        {
            tracing::info!("All robots at rest after {} ticks", ticks);
            return true;
        }
        false
    }

    /// Flush the sinks and write robot snapshots if configured.
    pub fn finish(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        if let Some(path) = self.snapshot_path.clone() {
            self.write_snapshots(&path)?;
        }
        Ok(())
    }

    /// Write every robot's snapshot as a pretty-printed JSON array.
    pub fn write_snapshots(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.coordinator.snapshots())?;
        std::fs::write(path, json)?;
        tracing::info!("Robot snapshots saved to {:?}", path);
        Ok(())
    }

    fn dispatch_due_tasks(&mut self) {
        let now = self.coordinator.tick_count();
        let due = self.tasks.iter().take_while(|t| t.at_tick <= now).count();

        for task in self.tasks.drain(..due).collect::<Vec<_>>() {
            let robot = RobotId(task.robot);
            let result = task
                .destination
                .resolve(self.coordinator.graph())
                .and_then(|destination| self.coordinator.assign_task(robot, destination));

            match result {
                Ok(true) => tracing::debug!("Dispatched task for robot {}", robot),
                Ok(false) => tracing::warn!(
                    "Robot {} declined task to {:?}",
                    robot,
                    task.destination
                ),
                Err(e) => tracing::warn!(
                    "Task for robot {} rejected [{}]: {}",
                    robot,
                    e.code(),
                    e
                ),
            }
        }
    }

    fn log_status(&self) {
        let robots = self.coordinator.robots();
        let count = |status: RobotStatus| robots.iter().filter(|r| r.status() == status).count();
        let mean_battery = if robots.is_empty() {
            0.0
        } else {
            robots.iter().map(|r| r.battery()).sum::<f32>() / robots.len() as f32
        };

        tracing::info!(
            "Tick {}: {} robots ({} moving, {} waiting, {} charging), battery {:.1}%, {} tasks queued",
            self.coordinator.tick_count(),
            robots.len(),
            count(RobotStatus::Moving),
            count(RobotStatus::Waiting),
            count(RobotStatus::Charging),
            mean_battery,
            self.tasks.len()
        );
    }
}
