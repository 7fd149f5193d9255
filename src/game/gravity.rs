use crossbeam_channel::{Receiver, Sender};
use rapier3d::prelude::*;
use tracing::{debug, info};

use super::physics::PhysicsWorld;

/// Broadcast on every gravity flip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityChanged {
    pub enabled: bool,
    /// Body velocity at the instant of the flip
    pub velocity: Vector<Real>,
}

/// Owns whether gravity acts on the player body.
pub struct GravityMode {
    body: RigidBodyHandle,
    enabled: bool,
    subscribers: Vec<Sender<GravityChanged>>,
}

impl GravityMode {
    pub fn new(body: RigidBodyHandle) -> Self {
        Self {
            body,
            enabled: true,
            subscribers: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Opens a new notification stream. Every toggle after this call is
    /// delivered to the returned receiver.
    pub fn subscribe(&mut self) -> Receiver<GravityChanged> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Flips gravity for the body and notifies subscribers.
    pub fn toggle(&mut self, world: &mut PhysicsWorld) {
        self.apply(world, !self.enabled);
    }

    /// Forces a given state, notifying only if it changed
    pub fn set(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        if self.enabled != enabled {
            self.apply(world, enabled);
        }
    }

    fn apply(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.enabled = enabled;
        world.set_gravity_enabled(self.body, enabled);

        let event = GravityChanged {
            enabled,
            velocity: world.get_velocity(self.body).unwrap_or_else(Vector::zeros),
        };
        info!(enabled, "Gravity toggled");

        // Dropped receivers are pruned.
        self.subscribers.retain(|tx| tx.send(event).is_ok());
        debug!(subscribers = self.subscribers.len(), "Gravity change delivered");
    }
}
