//! Randomised fleet runs checked against the occupancy rules after every tick.

mod common;

use std::collections::HashMap;

use common::{fleet_with, grid_level, v};
use dhruva_fleet::{FleetConfig, FleetCoordinator, RobotStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WIDTH: usize = 5;
const HEIGHT: usize = 5;
const ROBOTS: usize = 6;
const TICKS: usize = 300;

fn check_invariants(fleet: &FleetCoordinator, seed: u64) {
    let graph = fleet.graph();
    let tick = fleet.tick_count();

    let mut per_vertex = HashMap::new();
    let mut moving_lanes = HashMap::new();

    for robot in fleet.robots() {
        let id = robot.id();
        assert!(
            (0.0..=100.0).contains(&robot.battery()),
            "seed {seed} tick {tick}: robot {id} battery {}",
            robot.battery()
        );
        assert!(
            (0.0..1.0).contains(&robot.progress()),
            "seed {seed} tick {tick}: robot {id} progress {}",
            robot.progress()
        );
        if robot.status().is_at_rest() {
            assert!(
                robot.current_lane().is_none(),
                "seed {seed} tick {tick}: resting robot {id} still on a lane"
            );
        }

        if let Some(vertex) = robot.current_vertex()
            && !graph.is_charger(vertex)
            && let Some(other) = per_vertex.insert(vertex, id)
        {
            panic!("seed {seed} tick {tick}: robots {other} and {id} share vertex {vertex}");
        }

        if robot.status() == RobotStatus::Moving
            && let Some(lane) = robot.lane_key()
            && let Some(other) = moving_lanes.insert(lane, id)
        {
            panic!("seed {seed} tick {tick}: robots {other} and {id} both moving on {lane:?}");
        }
    }
}

fn random_run(seed: u64, config: &FleetConfig) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fleet = fleet_with(grid_level(WIDTH, HEIGHT), config);
    let vertex_count = WIDTH * HEIGHT;

    while fleet.robots().len() < ROBOTS {
        // Spawn errors on taken vertices are expected
        let _ = fleet.spawn(v(rng.gen_range(0..vertex_count)));
    }
    check_invariants(&fleet, seed);

    let ids: Vec<_> = fleet.robots().iter().map(|r| r.id()).collect();
    for _ in 0..TICKS {
        if rng.gen_bool(0.2) {
            let robot = ids[rng.gen_range(0..ids.len())];
            let _ = fleet.assign_task(robot, v(rng.gen_range(0..vertex_count)));
        }
        fleet.tick();
        check_invariants(&fleet, seed);
    }
}

#[test]
fn test_random_tasks_keep_occupancy_rules() {
    let config = FleetConfig::default();
    for seed in 0..8 {
        random_run(seed, &config);
    }
}

#[test]
fn test_random_tasks_with_short_timeouts_and_weak_batteries() {
    let mut config = FleetConfig::default();
    config.robot.speed = 0.25;
    config.robot.initial_battery = 30.0;
    config.robot.battery_drain_per_tick = 0.5;
    config.robot.wait_timeout_ticks = 8;
    for seed in 100..108 {
        random_run(seed, &config);
    }
}

#[test]
fn test_random_tasks_with_strict_reservations() {
    let mut config = FleetConfig::default();
    config.traffic.strict_reservations = true;
    config.robot.speed = 0.2;
    for seed in 200..206 {
        random_run(seed, &config);
    }
}
