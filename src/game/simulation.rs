//! Headless frame loop: one variable-rate player update per frame followed by
//! as many fixed physics steps as the accumulated time allows.

use rapier3d::prelude::*;
use tracing::{debug, warn};

use super::input::TickInput;
use super::level::{build_demo_level, DemoLevel};
use super::physics::PhysicsWorld;
use super::player::{Player, TickReport};
use crate::config::{ConfigError, ControllerConfig};

/// Fixed timestep accumulator
#[derive(Debug)]
pub struct StepAccumulator {
    accumulated: f32,
    pub fixed_timestep: f32,
    max_steps: u32,
}

impl StepAccumulator {
    pub fn new(fixed_timestep: f32, max_steps: u32) -> Self {
        Self {
            accumulated: 0.0,
            fixed_timestep,
            max_steps,
        }
    }

    /// Adds frame time and returns the number of fixed steps to run
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        self.accumulated += delta_time.max(0.0);

        // Prevent spiral of death
        let limit = self.fixed_timestep * self.max_steps as f32;
        if self.accumulated > limit {
            warn!(
                accumulated = self.accumulated,
                max_steps = self.max_steps,
                "Frame time too large, dropping simulation time"
            );
            self.accumulated = limit;
        }

        let steps = (self.accumulated / self.fixed_timestep) as u32;
        self.accumulated -= steps as f32 * self.fixed_timestep;
        steps
    }

    /// How far between fixed steps we are, in [0, 1)
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulated / self.fixed_timestep
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

pub struct Simulation {
    physics: PhysicsWorld,
    player: Player,
    accumulator: StepAccumulator,
    tick: u64,
}

impl Simulation {
    /// Spawns the player into an already built world.
    pub fn new(
        config: &ControllerConfig,
        mut physics: PhysicsWorld,
        spawn: [f32; 3],
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let player = Player::spawn(&mut physics, spawn, config);
        Ok(Self {
            physics,
            player,
            accumulator: StepAccumulator::new(
                config.physics.timestep,
                config.physics.max_steps_per_frame,
            ),
            tick: 0,
        })
    }

    /// Builds the demo level and spawns the player at its spawn point.
    pub fn with_demo_level(config: &ControllerConfig) -> Result<(Self, DemoLevel), ConfigError> {
        config.validate()?;
        let mut physics = PhysicsWorld::with_gravity(config.physics.gravity);
        let level = build_demo_level(&mut physics);
        let simulation = Self::new(config, physics, level.spawn)?;
        Ok((simulation, level))
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn timestep(&self) -> f32 {
        self.accumulator.fixed_timestep
    }

    /// Player body position, if the body still exists
    pub fn player_position(&self) -> Option<Vector<Real>> {
        self.physics.get_position(self.player.body().body)
    }

    fn fixed_step(&mut self) {
        let dt = self.accumulator.fixed_timestep;
        self.player.fixed_update(&mut self.physics, dt);
        self.physics.step(dt);
        self.player.after_step(&self.physics);
    }

    /// Runs one rendered frame worth of simulation.
    pub fn frame(&mut self, input: &TickInput, frame_dt: f32) -> TickReport {
        let report = self.player.update(&mut self.physics, input);
        let steps = self.accumulator.accumulate(frame_dt);
        for _ in 0..steps {
            self.fixed_step();
        }
        self.tick += 1;
        debug!(tick = self.tick, steps, ?report, "Frame");
        report
    }

    /// Runs exactly one variable update and one fixed step.
    pub fn tick(&mut self, input: &TickInput) -> TickReport {
        let report = self.player.update(&mut self.physics, input);
        self.fixed_step();
        self.tick += 1;
        report
    }

    /// Moves the player to a saved position in the default state.
    pub fn restore(&mut self, position: Vector<Real>) {
        self.accumulator.reset();
        self.player.restore(&mut self.physics, position);
    }
}
