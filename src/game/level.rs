use rapier3d::prelude::*;
use tracing::info;

use super::physics::PhysicsWorld;

/// Colliders of the demo level, for callers that want to aim at them
#[derive(Debug, Clone)]
pub struct DemoLevel {
    pub spawn: [f32; 3],
    pub floor: ColliderHandle,
    pub wall: ColliderHandle,
    pub ceiling: ColliderHandle,
    pub handles: Vec<ColliderHandle>,
}

/// Floor top at y=0
pub const FLOOR_HALF_EXTENTS: [f32; 3] = [20.0, 0.5, 20.0];
/// Wall face at x=8, facing -X
pub const WALL_X: f32 = 8.0;
/// Underside of the low ceiling slab
pub const CEILING_UNDERSIDE: f32 = 1.6;

const HANDLE_HALF_EXTENTS: [f32; 3] = [0.1, 0.1, 0.1];
const HANDLE_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 1.5, 3.0],
    [WALL_X - 0.1, 2.0, -2.0],
    [-3.0, 4.0, 6.0],
    [3.0, 6.0, -6.0],
];

/// Builds a small room: a floor, one wall, a low ceiling slab to crouch
/// under and a few handles, some out of reach from the floor.
pub fn build_demo_level(world: &mut PhysicsWorld) -> DemoLevel {
    let floor = world.add_static_box([0.0, -0.5, 0.0], FLOOR_HALF_EXTENTS);
    let wall = world.add_static_box([WALL_X + 0.5, 5.0, 0.0], [0.5, 5.0, 20.0]);
    let ceiling = world.add_static_box([-6.0, CEILING_UNDERSIDE + 0.1, 0.0], [2.0, 0.1, 2.0]);
    let handles = HANDLE_POSITIONS
        .iter()
        .map(|position| world.add_handle(*position, HANDLE_HALF_EXTENTS))
        .collect::<Vec<_>>();
    world.refresh_queries();

    info!(handles = handles.len(), "Demo level built");
    DemoLevel {
        spawn: [0.0, 1.0, 0.0],
        floor,
        wall,
        ceiling,
        handles,
    }
}
