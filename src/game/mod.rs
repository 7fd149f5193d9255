//! Player locomotion and zero-gravity grab/push, on top of a Rapier world.

pub mod constants;
pub mod crosshair;
pub mod grab;
pub mod gravity;
pub mod input;
pub mod level;
pub mod locomotion;
pub mod physics;
pub mod player;
pub mod query;
pub mod simulation;

pub use input::TickInput;
pub use locomotion::Regime;
pub use physics::PhysicsWorld;
pub use player::{Player, TickReport};
pub use simulation::Simulation;
