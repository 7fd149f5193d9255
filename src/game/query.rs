//! World query seam consumed by the controllers.
//!
//! The controllers only ever ask the world three questions: what does a ray
//! hit, which colliders overlap a sphere, and where is the closest point of a
//! given collider. `PhysicsWorld` answers them with Rapier; tests can answer
//! them with a fixed table.

use rapier3d::prelude::*;

/// Environment geometry: floors, walls, ceilings
pub const GROUP_ENVIRONMENT: Group = Group::GROUP_1;
/// The controlled player body
pub const GROUP_CHARACTER: Group = Group::GROUP_2;
/// Grabbable handles
pub const GROUP_HANDLE: Group = Group::GROUP_3;

/// Layer mask for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLayers(pub Group);

impl QueryLayers {
    /// Only grabbable handles
    pub const HANDLES: Self = Self(GROUP_HANDLE);
    /// Anything solid the player can stand on or bump into
    pub const SOLID: Self = Self(GROUP_ENVIRONMENT.union(GROUP_HANDLE));

    /// Interaction groups used when querying as the player, so the player's
    /// own collider never matches.
    pub fn as_interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(GROUP_CHARACTER, self.0)
    }
}

/// Result of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub collider: ColliderHandle,
    pub point: Point<Real>,
    /// Surface normal at the hit, pointing back toward the ray origin side
    pub normal: Vector<Real>,
    pub distance: Real,
}

/// Point-in-time geometric queries against the current world state.
pub trait WorldQuery {
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
        layers: QueryLayers,
    ) -> Option<RayHit>;

    fn overlap_sphere(
        &self,
        origin: Point<Real>,
        radius: Real,
        layers: QueryLayers,
    ) -> Vec<ColliderHandle>;

    fn closest_point(&self, collider: ColliderHandle, point: Point<Real>) -> Option<Point<Real>>;
}
