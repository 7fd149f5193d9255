//! End-to-end locomotion scenarios against a real Rapier world.
//!
//! Run with: cargo test --test locomotion_scenarios_test -- --nocapture

use rapier3d::prelude::*;
use std::path::Path;

use weightless::config::{ControllerConfig, MovementConfig};
use weightless::game::gravity::GravityMode;
use weightless::game::input::Heading;
use weightless::game::locomotion::LocomotionController;
use weightless::game::{PhysicsWorld, Player, Regime, Simulation, TickInput};
use weightless::save::SaveManager;

const DT: f32 = 1.0 / 60.0;

fn floor_world() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
    world.refresh_queries();
    world
}

/// Open space, player floating at y=5 with gravity already off and the
/// given drift velocity.
fn drifting(world: PhysicsWorld, velocity: Vector<Real>) -> Simulation {
    let mut sim = Simulation::new(&ControllerConfig::default(), world, [0.0, 5.0, 0.0]).unwrap();
    let body = sim.player().body().body;
    sim.physics_mut().set_velocity(body, velocity);
    let report = sim.tick(&TickInput {
        gravity_toggle: true,
        ..Default::default()
    });
    assert!(!report.gravity_enabled);
    assert_eq!(report.regime, Regime::Weightless);
    sim
}

fn velocity(sim: &Simulation) -> Vector<Real> {
    sim.physics()
        .get_velocity(sim.player().body().body)
        .unwrap()
}

#[test]
fn test_grounded_walk_leaves_vertical_velocity() {
    let mut world = floor_world();
    let mut player = Player::spawn(&mut world, [0.0, 1.0, 0.0], &ControllerConfig::default());
    let body = player.body().body;
    world.set_velocity(body, vector![0.0, -0.3, 0.0]);

    let input = TickInput {
        forward: 1.0,
        strafe: 1.0,
        heading: Some(Heading::from_yaw(0.0)),
        ..Default::default()
    };
    let report = player.update(&mut world, &input);
    assert_eq!(report.regime, Regime::Grounded);
    player.fixed_update(&mut world, DT);

    let v = world.get_velocity(body).unwrap();
    assert_eq!(v.y, -0.3);
    assert!((vector![v.x, 0.0, v.z].norm() - 5.0).abs() < 1e-4);
}

#[test]
fn test_double_toggle_keeps_flag_and_inertia() {
    let mut world = floor_world();
    let config = MovementConfig::default();
    let body = world.add_player([0.0, 1.0, 0.0], &config);
    world.refresh_queries();
    world.set_velocity(body.body, vector![1.0, 0.0, 2.0]);

    let mut gravity = GravityMode::new(body.body);
    let mut locomotion = LocomotionController::new(config, body, gravity.subscribe(), true);

    gravity.toggle(&mut world);
    gravity.toggle(&mut world);
    locomotion.update(&mut world, &TickInput::default());

    assert!(gravity.is_enabled());
    assert_eq!(world.is_gravity_enabled(body.body), Some(true));
    assert_eq!(locomotion.regime(), Regime::Grounded);
    assert_eq!(locomotion.saved_velocity(), vector![1.0, 0.0, 2.0]);
}

#[test]
fn test_weightless_coasting_preserves_velocity() {
    let start = vector![1.0, 0.5, -2.0];
    let mut sim = drifting(PhysicsWorld::new(), start);

    for _ in 0..120 {
        sim.tick(&TickInput::default());
    }
    assert!((velocity(&sim) - start).norm() < 1e-4);
    assert!((sim.player().locomotion().saved_velocity() - start).norm() < 1e-4);
}

#[test]
fn test_weightless_thrust_is_capped() {
    let mut sim = drifting(PhysicsWorld::new(), Vector::zeros());
    let thrust = TickInput {
        forward: 1.0,
        heading: Some(Heading::from_yaw(0.0)),
        ..Default::default()
    };

    for _ in 0..10 {
        sim.tick(&thrust);
    }
    let v = velocity(&sim);
    assert!(v.norm() <= 7.5 + 1e-4);
    assert!(v.z > 0.0);

    for _ in 0..300 {
        sim.tick(&thrust);
    }
    assert!((velocity(&sim).norm() - 7.5).abs() < 1e-3);
}

#[test]
fn test_drift_into_wall_slides_along_it() {
    let mut world = PhysicsWorld::new();
    // Wall face at x = 3
    world.add_static_box([3.5, 5.0, 0.0], [0.5, 10.0, 20.0]);
    world.refresh_queries();
    let mut sim = drifting(world, vector![4.0, 0.0, 1.0]);

    for _ in 0..120 {
        sim.tick(&TickInput::default());
    }

    let saved = sim.player().locomotion().saved_velocity();
    assert!(saved.x.abs() < 1e-3, "wall-normal component left: {}", saved.x);
    assert!((saved.z - 1.0).abs() < 1e-3);
    let x = sim.player_position().unwrap().x;
    assert!(x < 3.0);
}

#[test]
fn test_falls_when_walking_off_ledge() {
    let mut world = PhysicsWorld::new();
    // Small platform around the origin
    world.add_static_box([0.0, -0.5, 0.0], [1.0, 0.5, 1.0]);
    world.refresh_queries();
    let mut sim = Simulation::new(&ControllerConfig::default(), world, [0.0, 1.0, 0.0]).unwrap();

    let walk = TickInput {
        forward: 1.0,
        heading: Some(Heading::from_yaw(0.0)),
        ..Default::default()
    };
    let mut regimes = Vec::new();
    for _ in 0..60 {
        regimes.push(sim.tick(&walk).regime);
    }
    assert_eq!(regimes[0], Regime::Grounded);
    assert_eq!(*regimes.last().unwrap(), Regime::Airborne);
    assert!(sim.player_position().unwrap().y < 1.0);
}

#[test]
fn test_restore_from_save_slot() {
    let dir = tempfile::TempDir::new().unwrap();
    let saves = SaveManager::new(dir.path());

    let (mut sim, _level) = Simulation::with_demo_level(&ControllerConfig::default()).unwrap();
    sim.tick(&TickInput {
        gravity_toggle: true,
        ..Default::default()
    });
    let body = sim.player().body().body;
    sim.physics_mut().set_position(body, vector![2.0, 3.0, -1.0]);
    saves.save(0, [2.0, 3.0, -1.0], "demo").unwrap();

    let (mut fresh, _level) = Simulation::with_demo_level(&ControllerConfig::default()).unwrap();
    let data = saves.load(0).unwrap();
    let [x, y, z] = data.position;
    fresh.restore(vector![x, y, z]);

    let report = fresh.player().report();
    assert!(report.gravity_enabled);
    assert!(!report.grabbing);
    assert_eq!(fresh.player_position(), Some(vector![2.0, 3.0, -1.0]));
    assert_eq!(velocity(&fresh), Vector::zeros());
}

#[test]
fn test_demo_script_grabs_and_pushes_off() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/push_off.json");
    let script: Vec<TickInput> =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let (mut sim, _level) = Simulation::with_demo_level(&ControllerConfig::default()).unwrap();

    let reports: Vec<_> = script.iter().map(|input| sim.tick(input)).collect();
    assert!(reports.iter().any(|r| r.grabbing));

    let push_tick = script.iter().position(|input| input.push).unwrap();
    assert!(reports[push_tick - 1].grabbing);
    assert!(!reports[push_tick].grabbing);
    assert_eq!(reports[push_tick].regime, Regime::Weightless);
    assert!(reports.last().unwrap().gravity_enabled);
}
