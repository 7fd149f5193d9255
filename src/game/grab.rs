//! Handle targeting and the grab / release / push-off protocol.
//!
//! While a grab session is alive the body is frozen and eased toward an
//! anchor just off the handle surface; the locomotion controller is suspended
//! for the whole session and gets authority back with an exit velocity.

use rapier3d::prelude::*;
use tracing::{debug, info};

use super::constants::physics::EPSILON;
use super::input::{flatten, ViewRay};
use super::locomotion::LocomotionController;
use super::physics::{MotionConstraints, PhysicsWorld, PlayerBody};
use super::query::{QueryLayers, WorldQuery};
use crate::config::GrabConfig;

/// How a target was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Hit by the view ray
    Aimed,
    /// Nearest handle inside the grab radius
    Nearby,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabTarget {
    pub collider: ColliderHandle,
    pub point: Point<Real>,
    /// Outward surface normal at `point`
    pub normal: Vector<Real>,
    pub distance: Real,
    pub source: TargetSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabSession {
    pub target: GrabTarget,
    pub anchor: Point<Real>,
    pub previous_constraints: MotionConstraints,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabState {
    Idle,
    Targeting(GrabTarget),
    Grabbed(GrabSession),
}

/// Picks the handle to grab. An aimed ray hit always wins; otherwise the
/// handle whose surface is closest to the body, first found on exact ties.
pub fn find_target<Q: WorldQuery>(
    query: &Q,
    body_position: Point<Real>,
    view: Option<&ViewRay>,
    config: &GrabConfig,
) -> Option<GrabTarget> {
    if let Some(view) = view {
        let hit = query.raycast(
            view.origin(),
            view.direction(),
            config.reach_distance,
            QueryLayers::HANDLES,
        );
        if let Some(hit) = hit {
            return Some(GrabTarget {
                collider: hit.collider,
                point: hit.point,
                normal: hit.normal,
                distance: hit.distance,
                source: TargetSource::Aimed,
            });
        }
    }

    let mut best: Option<GrabTarget> = None;
    for collider in query.overlap_sphere(body_position, config.grab_radius, QueryLayers::HANDLES) {
        let Some(point) = query.closest_point(collider, body_position) else {
            continue;
        };
        let offset = body_position - point;
        let distance = offset.norm();
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(GrabTarget {
                collider,
                point,
                // Inside the handle there is no direction to go; fall back to up.
                normal: offset.try_normalize(EPSILON).unwrap_or_else(Vector::y),
                distance,
                source: TargetSource::Nearby,
            });
        }
    }
    best
}

/// Grab/push state machine for the player body.
pub struct GrabController {
    config: GrabConfig,
    mass: f32,
    player: PlayerBody,
    state: GrabState,
    target_available: bool,
}

impl GrabController {
    pub fn new(config: GrabConfig, mass: f32, player: PlayerBody) -> Self {
        Self {
            config,
            mass,
            player,
            state: GrabState::Idle,
            target_available: false,
        }
    }

    pub fn state(&self) -> &GrabState {
        &self.state
    }

    pub fn is_grabbing(&self) -> bool {
        matches!(self.state, GrabState::Grabbed(_))
    }

    pub fn session(&self) -> Option<&GrabSession> {
        match &self.state {
            GrabState::Grabbed(session) => Some(session),
            _ => None,
        }
    }

    /// Whether a handle was in reach at the last refresh
    pub fn target_available(&self) -> bool {
        self.target_available
    }

    /// Re-runs the target search. Runs every tick, grabbed or not, so the
    /// crosshair stays truthful; only outside a session does it move the
    /// state between Idle and Targeting.
    pub fn refresh_target<Q: WorldQuery>(
        &mut self,
        query: &Q,
        body_position: Point<Real>,
        view: Option<&ViewRay>,
    ) -> bool {
        let target = find_target(query, body_position, view, &self.config);
        self.target_available = target.is_some();

        if !self.is_grabbing() {
            self.state = match target {
                Some(target) => GrabState::Targeting(target),
                None => GrabState::Idle,
            };
        }
        self.target_available
    }

    /// Latches onto the current target. No-op without one.
    pub fn grab(&mut self, world: &mut PhysicsWorld, locomotion: &mut LocomotionController) -> bool {
        let GrabState::Targeting(target) = self.state else {
            debug!("Grab ignored: no target");
            return false;
        };
        let body = self.player.body;

        let anchor = target.point + target.normal * self.config.clearance;
        let previous_constraints = world
            .get_constraints(body)
            .unwrap_or(MotionConstraints::FrozenRotation);

        // Face away from the surface; a purely vertical normal leaves yaw as is.
        let facing = flatten(target.normal);
        if facing.norm_squared() > 0.0 {
            world.set_yaw(body, facing.x.atan2(facing.z));
        }

        world.set_constraints(body, MotionConstraints::FrozenAll);
        world.set_velocity(body, Vector::zeros());
        world.set_angular_velocity(body, Vector::zeros());
        locomotion.suspend();

        info!(
            handle = ?target.collider,
            source = ?target.source,
            anchor = ?anchor,
            "Grabbed handle"
        );
        self.state = GrabState::Grabbed(GrabSession {
            target,
            anchor,
            previous_constraints,
        });
        true
    }

    fn end_session(&mut self, world: &mut PhysicsWorld) -> Option<GrabSession> {
        let GrabState::Grabbed(session) = self.state else {
            return None;
        };
        self.state = GrabState::Idle;
        debug!(
            previous = ?session.previous_constraints,
            "Grab session ended, restoring rotation-only freeze"
        );
        world.set_constraints(self.player.body, MotionConstraints::FrozenRotation);
        world.set_angular_velocity(self.player.body, Vector::zeros());
        Some(session)
    }

    /// Lets go and comes to a full stop.
    pub fn release(
        &mut self,
        world: &mut PhysicsWorld,
        locomotion: &mut LocomotionController,
    ) -> bool {
        if self.end_session(world).is_none() {
            debug!("Release ignored: not grabbing");
            return false;
        }
        world.set_velocity(self.player.body, Vector::zeros());
        locomotion.resume(Vector::zeros());
        info!("Released handle");
        true
    }

    /// Lets go and launches along `view_direction` at push_force / mass.
    pub fn push(
        &mut self,
        world: &mut PhysicsWorld,
        locomotion: &mut LocomotionController,
        view_direction: Vector<Real>,
    ) -> bool {
        if self.end_session(world).is_none() {
            debug!("Push ignored: not grabbing");
            return false;
        }
        let direction = view_direction
            .try_normalize(EPSILON)
            .unwrap_or_else(Vector::zeros);
        let exit = direction * (self.config.push_force / self.mass);
        world.set_velocity(self.player.body, exit);
        locomotion.resume(exit);
        info!(speed = exit.norm(), "Pushed off handle");
        true
    }

    /// Fixed-rate phase: eases the frozen body toward the anchor.
    pub fn fixed_update(&mut self, world: &mut PhysicsWorld, dt: f32) {
        let GrabState::Grabbed(session) = &self.state else {
            return;
        };
        let Some(position) = world.get_position(self.player.body) else {
            return;
        };
        let alpha = 1.0 - (-self.config.ease_rate * dt).exp();
        let next = position + (session.anchor.coords - position) * alpha;
        world.set_position(self.player.body, next);
        world.set_velocity(self.player.body, Vector::zeros());
    }

    /// Drops any session without touching velocity; used on load.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.end_session(world);
        self.state = GrabState::Idle;
        self.target_available = false;
    }
}
