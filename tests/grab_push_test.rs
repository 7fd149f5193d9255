//! Grab, release and push-off through the player rig.

use rapier3d::prelude::*;

use weightless::config::ControllerConfig;
use weightless::game::grab::{GrabState, TargetSource};
use weightless::game::input::{Heading, ViewRay};
use weightless::game::physics::MotionConstraints;
use weightless::game::{PhysicsWorld, Regime, Simulation, TickInput};

/// Floor plus one small handle two meters ahead at eye height
fn handle_world() -> (PhysicsWorld, ColliderHandle) {
    let mut world = PhysicsWorld::new();
    world.add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0]);
    let handle = world.add_handle([0.0, 1.5, 2.0], [0.1, 0.1, 0.1]);
    world.refresh_queries();
    (world, handle)
}

fn view(direction: [f32; 3]) -> Option<ViewRay> {
    Some(ViewRay {
        origin: [0.0, 1.5, 0.0],
        direction,
    })
}

fn grab_input() -> TickInput {
    TickInput {
        grab_toggle: true,
        view: view([0.0, 0.0, 1.0]),
        ..Default::default()
    }
}

fn grabbed_sim(gravity_off: bool) -> (Simulation, ColliderHandle) {
    let (world, handle) = handle_world();
    let mut sim = Simulation::new(&ControllerConfig::default(), world, [0.0, 1.0, 0.0]).unwrap();
    if gravity_off {
        sim.tick(&TickInput {
            gravity_toggle: true,
            ..Default::default()
        });
    }
    let report = sim.tick(&grab_input());
    assert!(report.grabbing);
    assert_eq!(report.regime, Regime::Suspended);
    (sim, handle)
}

fn body_velocity(sim: &Simulation) -> Vector<Real> {
    sim.physics()
        .get_velocity(sim.player().body().body)
        .unwrap()
}

#[test]
fn test_grab_freezes_and_eases_to_anchor() {
    let (mut sim, handle) = grabbed_sim(false);
    let body = sim.player().body().body;

    let session = *sim.player().grab().session().unwrap();
    assert_eq!(session.target.collider, handle);
    assert_eq!(session.target.source, TargetSource::Aimed);
    assert_eq!(session.previous_constraints, MotionConstraints::FrozenRotation);
    // Handle face at z = 1.9, clearance 0.5
    assert!((session.anchor - point![0.0, 1.5, 1.4]).norm() < 1e-4);

    assert_eq!(
        sim.physics().get_constraints(body),
        Some(MotionConstraints::FrozenAll)
    );
    // Facing away from the handle face (normal -Z)
    let yaw = sim.physics().get_yaw(body).unwrap();
    assert!((yaw.abs() - std::f32::consts::PI).abs() < 1e-3);

    for _ in 0..90 {
        let report = sim.tick(&TickInput::default());
        assert!(report.grabbing);
    }
    let position = sim.player_position().unwrap();
    assert!((position - session.anchor.coords).norm() < 1e-2);
    assert!(body_velocity(&sim).norm() < 1e-4);
}

#[test]
fn test_release_stops_dead() {
    let (mut sim, _handle) = grabbed_sim(true);
    for _ in 0..10 {
        sim.tick(&TickInput::default());
    }

    let report = sim.tick(&grab_input());
    assert!(!report.grabbing);
    assert_eq!(report.regime, Regime::Weightless);
    assert_eq!(sim.player().locomotion().saved_velocity(), Vector::zeros());
    assert_eq!(body_velocity(&sim), Vector::zeros());
    assert_eq!(
        sim.physics().get_constraints(sim.player().body().body),
        Some(MotionConstraints::FrozenRotation)
    );
}

#[test]
fn test_push_launches_along_view() {
    let (mut sim, _handle) = grabbed_sim(true);
    sim.tick(&TickInput::default());

    let push = TickInput {
        push: true,
        view: view([0.0, 0.0, -2.0]),
        ..Default::default()
    };
    let report = sim.tick(&push);
    assert!(!report.grabbing);
    assert_eq!(report.regime, Regime::Weightless);
    assert!(!report.gravity_enabled);

    let expected = vector![0.0, 0.0, -10.0];
    assert!((sim.player().locomotion().saved_velocity() - expected).norm() < 1e-4);
    assert!((body_velocity(&sim) - expected).norm() < 1e-4);

    // Coasting keeps the push speed even above the thrust cap.
    for _ in 0..30 {
        sim.tick(&TickInput::default());
    }
    assert!((body_velocity(&sim) - expected).norm() < 1e-3);
}

#[test]
fn test_thrust_after_push_clamps_to_cap() {
    let (mut sim, _handle) = grabbed_sim(true);
    // Ease off the floor first
    for _ in 0..30 {
        sim.tick(&TickInput::default());
    }
    sim.tick(&TickInput {
        push: true,
        view: view([0.0, 0.0, -1.0]),
        ..Default::default()
    });
    assert!((body_velocity(&sim).norm() - 10.0).abs() < 1e-4);

    // Thrust along the push direction (yaw pi faces -Z)
    let thrust = TickInput {
        forward: 1.0,
        heading: Some(Heading::from_yaw(std::f32::consts::PI)),
        ..Default::default()
    };
    for _ in 0..60 {
        sim.tick(&thrust);
    }
    let v = body_velocity(&sim);
    assert!((v.norm() - 7.5).abs() < 1e-3);
    assert!(v.z < 0.0);
}

/// Weightless body clear of the floor, already coasting toward the handle
/// when it grabs
fn grabbed_while_drifting() -> Simulation {
    let (world, _handle) = handle_world();
    let mut sim = Simulation::new(&ControllerConfig::default(), world, [0.0, 1.5, 0.0]).unwrap();
    let body = sim.player().body().body;
    sim.physics_mut().set_velocity(body, vector![0.0, 0.0, 0.3]);
    sim.tick(&TickInput {
        gravity_toggle: true,
        ..Default::default()
    });
    for _ in 0..5 {
        sim.tick(&TickInput::default());
    }
    assert!((sim.player().locomotion().saved_velocity() - vector![0.0, 0.0, 0.3]).norm() < 1e-4);

    let report = sim.tick(&grab_input());
    assert!(report.grabbing);
    sim
}

#[test]
fn test_release_after_drift_stops_dead() {
    let mut sim = grabbed_while_drifting();
    sim.tick(&TickInput::default());

    let report = sim.tick(&grab_input());
    assert!(!report.grabbing);
    assert_eq!(report.regime, Regime::Weightless);
    assert_eq!(sim.player().locomotion().saved_velocity(), Vector::zeros());
    assert_eq!(body_velocity(&sim), Vector::zeros());
}

#[test]
fn test_push_after_drift_discards_old_velocity() {
    let mut sim = grabbed_while_drifting();
    sim.tick(&TickInput::default());

    sim.tick(&TickInput {
        push: true,
        view: view([0.6, 0.0, -0.8]),
        ..Default::default()
    });
    let config = ControllerConfig::default();
    let expected = vector![0.6, 0.0, -0.8] * (config.grab.push_force / config.movement.mass);
    assert!((sim.player().locomotion().saved_velocity() - expected).norm() < 1e-4);
    assert!((body_velocity(&sim) - expected).norm() < 1e-4);
}

#[test]
fn test_push_with_gravity_keeps_gravity() {
    let (mut sim, _handle) = grabbed_sim(false);
    // Ease up to the anchor so the floor is out of probe reach.
    for _ in 0..30 {
        sim.tick(&TickInput::default());
    }
    let push = TickInput {
        push: true,
        view: view([0.0, 0.0, -1.0]),
        ..Default::default()
    };
    let report = sim.tick(&push);
    assert!(report.gravity_enabled);
    assert_eq!(report.regime, Regime::Airborne);
}

#[test]
fn test_invalid_requests_are_noops() {
    let (world, _handle) = handle_world();
    let mut sim = Simulation::new(&ControllerConfig::default(), world, [0.0, 1.0, 0.0]).unwrap();

    // Push and release without a session
    let report = sim.tick(&TickInput {
        push: true,
        view: view([0.0, 0.0, 1.0]),
        ..Default::default()
    });
    assert!(!report.grabbing);
    assert_eq!(report.regime, Regime::Grounded);

    // Grab while looking away from the handle and out of overlap range
    let report = sim.tick(&TickInput {
        grab_toggle: true,
        view: view([0.0, 0.0, -1.0]),
        ..Default::default()
    });
    assert!(!report.grabbing);
    assert!(!report.target_available);
    assert_eq!(*sim.player().grab().state(), GrabState::Idle);
}

#[test]
fn test_target_reported_while_grabbed() {
    let (mut sim, _handle) = grabbed_sim(false);
    let report = sim.tick(&TickInput {
        view: view([0.0, 0.0, 1.0]),
        ..Default::default()
    });
    assert!(report.grabbing);
    assert!(report.target_available);
}
