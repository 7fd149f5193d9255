use crossbeam_channel::Receiver;
use rapier3d::prelude::*;
use tracing::{debug, warn};

use super::constants::physics::EPSILON;
use super::gravity::GravityChanged;
use super::input::TickInput;
use super::physics::{PhysicsWorld, PlayerBody};
use super::query::{QueryLayers, WorldQuery};
use crate::config::MovementConfig;

/// Which physical regime currently drives the body's velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Gravity on, standing on something: velocity is written from input
    Grounded,
    /// Gravity on, off the ground: integration runs untouched
    Airborne,
    /// Gravity off: the body coasts at the saved inertial velocity
    Weightless,
    /// A grab session owns the body
    Suspended,
}

/// Velocity to write this fixed step, and the new saved inertia.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPlan {
    pub velocity: Vector<Real>,
    pub saved: Vector<Real>,
}

/// Build the velocity for one fixed step. `None` means leave the body to the
/// integrator.
pub fn plan_velocity(
    regime: Regime,
    current: Vector<Real>,
    saved: Vector<Real>,
    move_direction: Vector<Real>,
    speed: f32,
    config: &MovementConfig,
    dt: f32,
) -> Option<VelocityPlan> {
    match regime {
        Regime::Grounded => {
            let target = move_direction * speed;
            let velocity = vector![target.x, current.y, target.z];
            Some(VelocityPlan {
                velocity,
                saved: velocity,
            })
        }
        Regime::Weightless => {
            let velocity = weightless_velocity(saved, move_direction, config, dt);
            Some(VelocityPlan {
                velocity,
                saved: velocity,
            })
        }
        Regime::Airborne | Regime::Suspended => None,
    }
}

/// Inertial coasting with optional thrust.
///
/// Without input the saved velocity is returned unchanged. Thrust adds
/// `move_speed * weightless_thrust_ratio` m/s² along the move direction and
/// the result is clamped to `max_weightless_speed`. A push-off faster than
/// the cap coasts at full speed until thrust is applied.
pub fn weightless_velocity(
    saved: Vector<Real>,
    move_direction: Vector<Real>,
    config: &MovementConfig,
    dt: f32,
) -> Vector<Real> {
    if move_direction.norm_squared() < EPSILON * EPSILON {
        return saved;
    }

    let accel = config.move_speed * config.weightless_thrust_ratio;
    let thrusted = saved + move_direction * accel * dt;
    let cap = config.max_weightless_speed();
    let speed = thrusted.norm();
    if speed > cap {
        thrusted * (cap / speed)
    } else {
        thrusted
    }
}

/// Removes the component of `velocity` along a steep surface normal.
/// Floors and gentle slopes (angle to up at most `max_angle`) leave it alone.
pub fn deflect_off_surface(velocity: Vector<Real>, normal: Vector<Real>, max_angle: f32) -> Vector<Real> {
    let Some(n) = normal.try_normalize(EPSILON) else {
        return velocity;
    };
    if n.angle(&Vector::y()) <= max_angle {
        return velocity;
    }
    velocity - n * velocity.dot(&n)
}

/// Per-tick locomotion state machine for the player body.
pub struct LocomotionController {
    config: MovementConfig,
    player: PlayerBody,
    regime: Regime,
    saved_velocity: Vector<Real>,
    move_direction: Vector<Real>,
    crouching: bool,
    gravity_enabled: bool,
    gravity_events: Receiver<GravityChanged>,
}

impl LocomotionController {
    pub fn new(
        config: MovementConfig,
        player: PlayerBody,
        gravity_events: Receiver<GravityChanged>,
        gravity_enabled: bool,
    ) -> Self {
        Self {
            config,
            player,
            regime: if gravity_enabled {
                Regime::Grounded
            } else {
                Regime::Weightless
            },
            saved_velocity: Vector::zeros(),
            move_direction: Vector::zeros(),
            crouching: false,
            gravity_enabled,
            gravity_events,
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn saved_velocity(&self) -> Vector<Real> {
        self.saved_velocity
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Current walking speed, reduced while crouched
    pub fn speed(&self) -> f32 {
        if self.crouching {
            self.config.crouch_speed
        } else {
            self.config.move_speed
        }
    }

    fn current_height(&self) -> f32 {
        if self.crouching {
            self.config.crouch_height
        } else {
            self.config.standing_height
        }
    }

    /// Short downward ray from the body center past the capsule base
    pub fn probe_ground<Q: WorldQuery>(&self, query: &Q, position: Vector<Real>) -> bool {
        let reach = self.current_height() * 0.5 + self.config.ground_probe_margin;
        query
            .raycast(
                Point::from(position),
                -Vector::y(),
                reach,
                QueryLayers::SOLID,
            )
            .is_some()
    }

    fn set_regime(&mut self, regime: Regime) {
        if self.regime != regime {
            debug!(from = ?self.regime, to = ?regime, "Locomotion regime changed");
            self.regime = regime;
        }
    }

    /// Consumes pending gravity notifications, snapshotting the velocity at
    /// each flip. While suspended the grab owns velocity, so only the flag is
    /// tracked.
    fn drain_gravity_events(&mut self) {
        while let Ok(event) = self.gravity_events.try_recv() {
            self.gravity_enabled = event.enabled;
            if self.regime != Regime::Suspended {
                self.saved_velocity = event.velocity;
            }
        }
    }

    /// Variable-rate phase: reads input, settles the regime for this tick and
    /// issues jump/crouch.
    pub fn update(&mut self, world: &mut PhysicsWorld, input: &TickInput) {
        self.drain_gravity_events();

        if self.regime == Regime::Suspended {
            self.move_direction = Vector::zeros();
            return;
        }

        let Some(position) = world.get_position(self.player.body) else {
            warn!(body = ?self.player.body, "Locomotion update skipped: player body missing");
            return;
        };

        self.move_direction = input.move_direction();

        let regime = if !self.gravity_enabled {
            Regime::Weightless
        } else if self.probe_ground(&*world, position) {
            Regime::Grounded
        } else {
            Regime::Airborne
        };
        self.set_regime(regime);

        if input.jump {
            self.try_jump(world);
        }
        if input.crouch_toggle {
            self.toggle_crouch(world, position);
        }
    }

    fn try_jump(&mut self, world: &mut PhysicsWorld) {
        if self.regime != Regime::Grounded {
            return;
        }
        let Some(mut velocity) = world.get_velocity(self.player.body) else {
            return;
        };
        self.saved_velocity = vector![velocity.x, 0.0, velocity.z];
        velocity.y += self.config.jump_force / self.config.mass;
        world.set_velocity(self.player.body, velocity);
        debug!(vy = velocity.y, "Jump");
    }

    /// Swaps the capsule between its presets. The body center moves by half
    /// the height difference so the feet stay where they are.
    fn toggle_crouch(&mut self, world: &mut PhysicsWorld, position: Vector<Real>) {
        let shift = Vector::y() * (self.config.standing_height - self.config.crouch_height) * 0.5;

        if !self.crouching {
            world.set_collider_height(
                self.player.collider,
                self.config.crouch_height,
                self.config.radius,
            );
            world.set_position(self.player.body, position - shift);
            self.crouching = true;
            debug!("Crouched");
            return;
        }

        // Headroom a standing capsule needs with its feet where they are now.
        let headroom = self.config.standing_height - self.config.crouch_height * 0.5;
        let blocked = world
            .raycast(
                Point::from(position),
                Vector::y(),
                headroom,
                QueryLayers::SOLID,
            )
            .is_some();
        if blocked {
            debug!("Stand-up blocked by overhead geometry");
            return;
        }

        world.set_collider_height(
            self.player.collider,
            self.config.standing_height,
            self.config.radius,
        );
        world.set_position(self.player.body, position + shift);
        self.crouching = false;
        debug!("Stood up");
    }

    /// Fixed-rate phase: writes the regime's velocity to the body.
    pub fn fixed_update(&mut self, world: &mut PhysicsWorld, dt: f32) {
        let Some(current) = world.get_velocity(self.player.body) else {
            return;
        };
        let plan = plan_velocity(
            self.regime,
            current,
            self.saved_velocity,
            self.move_direction,
            self.speed(),
            &self.config,
            dt,
        );
        if let Some(plan) = plan {
            world.set_velocity(self.player.body, plan.velocity);
            self.saved_velocity = plan.saved;
        }
    }

    /// Collision response: strip saved inertia pressing into steep surfaces.
    pub fn apply_contact_normals(&mut self, normals: &[Vector<Real>]) {
        if self.regime == Regime::Suspended {
            return;
        }
        let max_angle = self.config.wall_angle_degrees.to_radians();
        for normal in normals {
            self.saved_velocity = deflect_off_surface(self.saved_velocity, *normal, max_angle);
        }
    }

    /// Hands velocity authority to a grab session.
    pub fn suspend(&mut self) {
        self.saved_velocity = Vector::zeros();
        self.move_direction = Vector::zeros();
        self.set_regime(Regime::Suspended);
    }

    /// Takes authority back after a grab, coasting at `exit_velocity`.
    /// A weighted body is treated as airborne until the next ground probe.
    pub fn resume(&mut self, exit_velocity: Vector<Real>) {
        self.drain_gravity_events();
        self.saved_velocity = exit_velocity;
        self.set_regime(if self.gravity_enabled {
            Regime::Airborne
        } else {
            Regime::Weightless
        });
    }

    /// Back to defaults after a load: weighted, standing, at rest.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        while self.gravity_events.try_recv().is_ok() {}
        self.gravity_enabled = true;
        if self.crouching {
            world.set_collider_height(
                self.player.collider,
                self.config.standing_height,
                self.config.radius,
            );
            self.crouching = false;
        }
        self.saved_velocity = Vector::zeros();
        self.move_direction = Vector::zeros();
        self.set_regime(Regime::Grounded);
    }
}
