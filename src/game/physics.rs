use nalgebra::UnitQuaternion;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;
use tracing::{debug, info};

use super::constants::physics as consts;
use super::query::{
    QueryLayers, RayHit, WorldQuery, GROUP_CHARACTER, GROUP_ENVIRONMENT, GROUP_HANDLE,
};
use crate::config::MovementConfig;

/// Which degrees of freedom the integrator may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionConstraints {
    Free,
    FrozenRotation,
    FrozenAll,
}

impl MotionConstraints {
    fn locked_axes(self) -> LockedAxes {
        match self {
            MotionConstraints::Free => LockedAxes::empty(),
            MotionConstraints::FrozenRotation => LockedAxes::ROTATION_LOCKED,
            MotionConstraints::FrozenAll => LockedAxes::all(),
        }
    }

    fn from_locked_axes(axes: LockedAxes) -> Self {
        if axes.contains(LockedAxes::all()) {
            MotionConstraints::FrozenAll
        } else if axes.contains(LockedAxes::ROTATION_LOCKED) {
            MotionConstraints::FrozenRotation
        } else {
            MotionConstraints::Free
        }
    }
}

/// Handles of the controlled player body and its capsule collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerBody {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Wrapper around the Rapier3D pipeline hosting the level geometry and the
/// player body.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

/// Capsule half-height of the cylinder part for a given total height.
fn capsule_half_height(height: f32, radius: f32) -> f32 {
    (height - 2.0 * radius).max(0.0) / 2.0
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        Self::with_gravity(consts::DEFAULT_GRAVITY)
    }

    /// Creates a new physics world pulling along -Y with the given magnitude
    pub fn with_gravity(gravity_y: f32) -> Self {
        info!(gravity = gravity_y, "Initializing physics world");
        Self {
            gravity: vector![0.0, -gravity_y, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Rebuilds the query acceleration structure from current collider poses.
    /// Needed after adding geometry and before the first query of a tick.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    fn add_fixed_box(
        &mut self,
        position: [f32; 3],
        half_extents: [f32; 3],
        group: Group,
    ) -> ColliderHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let handle = self.rigid_body_set.insert(body);
        let [hx, hy, hz] = half_extents;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(group, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set)
    }

    /// Adds static level geometry (floor, wall, ceiling)
    pub fn add_static_box(&mut self, position: [f32; 3], half_extents: [f32; 3]) -> ColliderHandle {
        self.add_fixed_box(position, half_extents, GROUP_ENVIRONMENT)
    }

    /// Adds a grabbable handle on the handle layer
    pub fn add_handle(&mut self, position: [f32; 3], half_extents: [f32; 3]) -> ColliderHandle {
        let handle = self.add_fixed_box(position, half_extents, GROUP_HANDLE);
        debug!(?handle, ?position, "Added handle");
        handle
    }

    /// Adds the dynamic player capsule.
    /// Mass comes entirely from the config so push-off speed is exact.
    pub fn add_player(&mut self, position: [f32; 3], movement: &MovementConfig) -> PlayerBody {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .locked_axes(MotionConstraints::FrozenRotation.locked_axes())
            .additional_mass(movement.mass)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let half_height = capsule_half_height(movement.standing_height, movement.radius);
        let collider = ColliderBuilder::capsule_y(half_height, movement.radius)
            .density(0.0)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, Group::ALL))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        PlayerBody {
            body: body_handle,
            collider: collider_handle,
        }
    }

    /// Whether both the player body and its collider are still present
    pub fn has_player(&self, player: PlayerBody) -> bool {
        self.rigid_body_set.contains(player.body) && self.collider_set.contains(player.collider)
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|body| *body.translation())
    }

    /// Teleports a rigid body
    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(position, true);
        }
    }

    /// Gets the linear velocity of a rigid body
    pub fn get_velocity(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|body| *body.linvel())
    }

    /// Sets the linear velocity of a dynamic body
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(velocity, true);
            }
        }
    }

    pub fn set_angular_velocity(&mut self, handle: RigidBodyHandle, angvel: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_angvel(angvel, true);
            }
        }
    }

    /// Heading angle around +Y; yaw 0 faces +Z
    pub fn get_yaw(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set.get(handle).map(|body| {
            let facing = body.rotation() * Vector::z();
            facing.x.atan2(facing.z)
        })
    }

    pub fn set_yaw(&mut self, handle: RigidBodyHandle, yaw: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_rotation(UnitQuaternion::from_axis_angle(&Vector::y_axis(), yaw), true);
        }
    }

    pub fn get_constraints(&self, handle: RigidBodyHandle) -> Option<MotionConstraints> {
        self.rigid_body_set
            .get(handle)
            .map(|body| MotionConstraints::from_locked_axes(body.locked_axes()))
    }

    pub fn set_constraints(&mut self, handle: RigidBodyHandle, constraints: MotionConstraints) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_locked_axes(constraints.locked_axes(), true);
        }
    }

    /// Toggles whether world gravity acts on the body.
    /// Clears accumulated forces but leaves velocity alone.
    pub fn set_gravity_enabled(&mut self, handle: RigidBodyHandle, enabled: bool) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_gravity_scale(if enabled { 1.0 } else { 0.0 }, true);
            if !enabled {
                body.reset_forces(true);
            }
        }
    }

    pub fn is_gravity_enabled(&self, handle: RigidBodyHandle) -> Option<bool> {
        self.rigid_body_set
            .get(handle)
            .map(|body| body.gravity_scale() > 0.0)
    }

    /// Rebuilds the capsule with a new total height, keeping its radius
    pub fn set_collider_height(&mut self, handle: ColliderHandle, height: f32, radius: f32) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_shape(SharedShape::capsule_y(
                capsule_half_height(height, radius),
                radius,
            ));
        }
    }

    /// Total height of a capsule collider
    pub fn get_collider_height(&self, handle: ColliderHandle) -> Option<f32> {
        let collider = self.collider_set.get(handle)?;
        let capsule = collider.shape().as_capsule()?;
        Some(capsule.height() + 2.0 * capsule.radius)
    }

    /// Surface normals of every active contact touching the collider, each
    /// oriented from the other surface toward this collider.
    pub fn contact_normals(&self, handle: ColliderHandle) -> Vec<Vector<Real>> {
        let mut normals = Vec::new();
        for pair in self.narrow_phase.contact_pairs_with(handle) {
            if !pair.has_any_active_contact {
                continue;
            }
            // Manifold normals point from collider1 toward collider2.
            let sign = if pair.collider1 == handle { -1.0 } else { 1.0 };
            for manifold in &pair.manifolds {
                if manifold.points.is_empty() {
                    continue;
                }
                normals.push(manifold.data.normal * sign);
            }
        }
        normals
    }
}

impl WorldQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
        layers: QueryLayers,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize(consts::EPSILON)?;
        let ray = Ray::new(origin, direction);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(layers.as_interaction_groups());

        let (collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true, // solid
            filter,
        )?;
        Some(RayHit {
            collider,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
            distance: hit.time_of_impact,
        })
    }

    fn overlap_sphere(
        &self,
        origin: Point<Real>,
        radius: Real,
        layers: QueryLayers,
    ) -> Vec<ColliderHandle> {
        let ball = Ball::new(radius);
        let pos = Isometry::translation(origin.x, origin.y, origin.z);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(layers.as_interaction_groups());

        let mut found = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &pos,
            &ball,
            filter,
            |collider| {
                found.push(collider);
                true // continue searching
            },
        );
        found
    }

    fn closest_point(&self, collider: ColliderHandle, point: Point<Real>) -> Option<Point<Real>> {
        let collider = self.collider_set.get(collider)?;
        let projection = collider
            .shape()
            .project_point(collider.position(), &point, true);
        Some(projection.point)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
