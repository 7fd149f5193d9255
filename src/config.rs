//! Controller configuration parsing from weightless.toml files

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::constants::{character, grab, physics};

/// Movement section: walking, jumping, crouching and weightless drift
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed in m/s
    pub move_speed: f32,
    /// Walking speed while crouched
    pub crouch_speed: f32,
    /// Upward impulse applied on jump
    pub jump_force: f32,
    /// Body mass in kg
    pub mass: f32,
    /// Capsule total height while standing
    pub standing_height: f32,
    /// Capsule total height while crouched
    pub crouch_height: f32,
    /// Capsule radius
    pub radius: f32,
    /// Ground probe reach below the capsule base
    pub ground_probe_margin: f32,
    /// Contacts steeper than this (degrees from up) deflect saved inertia
    pub wall_angle_degrees: f32,
    /// Weightless thrust as a fraction of move speed per second
    pub weightless_thrust_ratio: f32,
    /// Weightless speed cap as a multiple of move speed
    pub max_speed_multiple: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: character::MOVE_SPEED,
            crouch_speed: character::CROUCH_SPEED,
            jump_force: character::JUMP_FORCE,
            mass: character::MASS,
            standing_height: character::STANDING_HEIGHT,
            crouch_height: character::CROUCH_HEIGHT,
            radius: character::RADIUS,
            ground_probe_margin: character::GROUND_PROBE_MARGIN,
            wall_angle_degrees: character::WALL_ANGLE_DEGREES,
            weightless_thrust_ratio: character::WEIGHTLESS_THRUST_RATIO,
            max_speed_multiple: character::MAX_SPEED_MULTIPLE,
        }
    }
}

impl MovementConfig {
    /// Speed cap while thrusting without gravity
    pub fn max_weightless_speed(&self) -> f32 {
        self.move_speed * self.max_speed_multiple
    }
}

/// Grab section: handle targeting and push-off
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    pub reach_distance: f32,
    pub grab_radius: f32,
    pub clearance: f32,
    pub push_force: f32,
    pub ease_rate: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            reach_distance: grab::REACH_DISTANCE,
            grab_radius: grab::GRAB_RADIUS,
            clearance: grab::CLEARANCE,
            push_force: grab::PUSH_FORCE,
            ease_rate: grab::EASE_RATE,
        }
    }
}

/// Physics section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude, applied along -Y
    pub gravity: f32,
    /// Fixed simulation step in seconds
    pub timestep: f32,
    /// Fixed steps allowed per rendered frame
    pub max_steps_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics::DEFAULT_GRAVITY,
            timestep: physics::TIMESTEP,
            max_steps_per_frame: physics::MAX_STEPS_PER_FRAME,
        }
    }
}

/// Full controller configuration from weightless.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub movement: MovementConfig,
    pub grab: GrabConfig,
    pub physics: PhysicsConfig,
}

impl ControllerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory containing weightless.toml
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&dir.join("weightless.toml"))
    }

    /// Rejects values that would make the controller misbehave silently
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.movement;
        let positive = [
            ("movement.move_speed", m.move_speed),
            ("movement.crouch_speed", m.crouch_speed),
            ("movement.mass", m.mass),
            ("movement.standing_height", m.standing_height),
            ("movement.crouch_height", m.crouch_height),
            ("movement.radius", m.radius),
            ("movement.max_speed_multiple", m.max_speed_multiple),
            ("grab.reach_distance", self.grab.reach_distance),
            ("grab.grab_radius", self.grab.grab_radius),
            ("grab.ease_rate", self.grab.ease_rate),
            ("physics.timestep", self.physics.timestep),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {}", value),
                });
            }
        }
        if m.crouch_height >= m.standing_height {
            return Err(ConfigError::Invalid {
                field: "movement.crouch_height",
                reason: format!(
                    "must be below standing_height ({} >= {})",
                    m.crouch_height, m.standing_height
                ),
            });
        }
        if self.physics.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid {
                field: "physics.max_steps_per_frame",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur when loading controller configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
