//! Player rig: wires gravity, locomotion and grab around one body and runs
//! them in a fixed order each tick.
//!
//! Variable phase (`update`): gravity toggle, target refresh, grab / release /
//! push, then locomotion transitions with jump and crouch. Fixed phase
//! (`fixed_update`): exactly one of grab easing or locomotion writes the
//! velocity. Post-step (`after_step`): contact deflection of saved inertia.

use rapier3d::prelude::*;
use tracing::{info, warn};

use super::crosshair::CrosshairFeedback;
use super::grab::GrabController;
use super::gravity::GravityMode;
use super::input::TickInput;
use super::locomotion::{LocomotionController, Regime};
use super::physics::{MotionConstraints, PhysicsWorld, PlayerBody};
use crate::config::ControllerConfig;

/// What one variable-phase tick settled on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub regime: Regime,
    pub target_available: bool,
    pub grabbing: bool,
    pub gravity_enabled: bool,
}

pub struct Player {
    body: PlayerBody,
    gravity: GravityMode,
    locomotion: LocomotionController,
    grab: GrabController,
    crosshair: Option<Box<dyn CrosshairFeedback>>,
    disabled: bool,
}

impl Player {
    /// Spawns the player body at `position` and wires its controllers.
    pub fn spawn(world: &mut PhysicsWorld, position: [f32; 3], config: &ControllerConfig) -> Self {
        let body = world.add_player(position, &config.movement);
        world.refresh_queries();
        Self::attach(body, config)
    }

    /// Wires controllers around an existing body.
    pub fn attach(body: PlayerBody, config: &ControllerConfig) -> Self {
        let mut gravity = GravityMode::new(body.body);
        let gravity_events = gravity.subscribe();
        let locomotion = LocomotionController::new(
            config.movement.clone(),
            body,
            gravity_events,
            gravity.is_enabled(),
        );
        let grab = GrabController::new(config.grab.clone(), config.movement.mass, body);

        Self {
            body,
            gravity,
            locomotion,
            grab,
            crosshair: None,
            disabled: false,
        }
    }

    pub fn with_crosshair(mut self, crosshair: Box<dyn CrosshairFeedback>) -> Self {
        self.set_crosshair(crosshair);
        self
    }

    pub fn set_crosshair(&mut self, crosshair: Box<dyn CrosshairFeedback>) {
        self.crosshair = Some(crosshair);
    }

    pub fn body(&self) -> PlayerBody {
        self.body
    }

    pub fn gravity(&self) -> &GravityMode {
        &self.gravity
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn grab(&self) -> &GrabController {
        &self.grab
    }

    /// True once the body went missing from the world
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn report(&self) -> TickReport {
        TickReport {
            regime: self.locomotion.regime(),
            target_available: self.grab.target_available(),
            grabbing: self.grab.is_grabbing(),
            gravity_enabled: self.gravity.is_enabled(),
        }
    }

    fn check_body(&mut self, world: &PhysicsWorld) -> bool {
        if self.disabled {
            return false;
        }
        if !world.has_player(self.body) {
            warn!(body = ?self.body.body, "Player body missing from physics world, disabling player");
            self.disabled = true;
            return false;
        }
        true
    }

    /// Variable-rate phase for one tick.
    pub fn update(&mut self, world: &mut PhysicsWorld, input: &TickInput) -> TickReport {
        if !self.check_body(world) {
            return self.report();
        }
        world.refresh_queries();

        if input.gravity_toggle {
            self.gravity.toggle(world);
        }

        if let Some(position) = world.get_position(self.body.body) {
            self.grab
                .refresh_target(&*world, Point::from(position), input.view.as_ref());
        }

        if self.grab.is_grabbing() {
            if input.push {
                let direction = input
                    .view
                    .map(|view| view.direction())
                    .unwrap_or_else(Vector::zeros);
                self.grab.push(world, &mut self.locomotion, direction);
            } else if input.grab_toggle {
                self.grab.release(world, &mut self.locomotion);
            }
        } else if input.grab_toggle {
            self.grab.grab(world, &mut self.locomotion);
        }

        let available = self.grab.target_available();
        if let Some(crosshair) = self.crosshair.as_mut() {
            crosshair.set_interactable(available);
        }

        self.locomotion.update(world, input);
        self.report()
    }

    /// Fixed-rate phase, before the physics step.
    pub fn fixed_update(&mut self, world: &mut PhysicsWorld, dt: f32) {
        if self.disabled {
            return;
        }
        if self.grab.is_grabbing() {
            self.grab.fixed_update(world, dt);
        } else {
            self.locomotion.fixed_update(world, dt);
        }
    }

    /// Collision response, after the physics step.
    pub fn after_step(&mut self, world: &PhysicsWorld) {
        if self.disabled {
            return;
        }
        let normals = world.contact_normals(self.body.collider);
        self.locomotion.apply_contact_normals(&normals);
    }

    /// Puts the player at `position` in the default state: weighted, standing,
    /// at rest, not grabbing.
    pub fn restore(&mut self, world: &mut PhysicsWorld, position: Vector<Real>) {
        if !self.check_body(world) {
            return;
        }
        self.grab.reset(world);
        self.gravity.set(world, true);
        self.locomotion.reset(world);

        world.set_constraints(self.body.body, MotionConstraints::FrozenRotation);
        world.set_position(self.body.body, position);
        world.set_velocity(self.body.body, Vector::zeros());
        world.set_angular_velocity(self.body.body, Vector::zeros());
        world.refresh_queries();
        info!(?position, "Player restored");
    }
}
