//! Locomotion and physics constants.

/// Physics constants
pub mod physics {
    /// Default gravity in m/s²
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Upper bound on fixed steps run for a single frame
    pub const MAX_STEPS_PER_FRAME: u32 = 8;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Player body defaults
pub mod character {
    /// Walking speed in m/s
    pub const MOVE_SPEED: f32 = 5.0;

    /// Walking speed while crouched
    pub const CROUCH_SPEED: f32 = 2.5;

    /// Upward impulse applied on jump
    pub const JUMP_FORCE: f32 = 5.0;

    /// Body mass in kg
    pub const MASS: f32 = 1.0;

    /// Capsule total height while standing
    pub const STANDING_HEIGHT: f32 = 2.0;

    /// Capsule total height while crouched
    pub const CROUCH_HEIGHT: f32 = 1.0;

    /// Capsule radius
    pub const RADIUS: f32 = 0.4;

    /// Extra reach of the ground probe below the capsule base
    pub const GROUND_PROBE_MARGIN: f32 = 0.1;

    /// Contacts steeper than this (degrees from up) deflect saved inertia
    pub const WALL_ANGLE_DEGREES: f32 = 45.0;

    /// Weightless thrust acceleration as a fraction of move speed per second
    pub const WEIGHTLESS_THRUST_RATIO: f32 = 1.0;

    /// Weightless speed cap as a multiple of move speed
    pub const MAX_SPEED_MULTIPLE: f32 = 1.5;
}

/// Handle grab defaults
pub mod grab {
    /// Max distance of the aimed grab ray
    pub const REACH_DISTANCE: f32 = 3.0;

    /// Radius of the overlap fallback around the body
    pub const GRAB_RADIUS: f32 = 1.5;

    /// Distance the anchor sits off the handle surface
    pub const CLEARANCE: f32 = 0.5;

    /// Push-off force (divided by mass to get exit speed)
    pub const PUSH_FORCE: f32 = 10.0;

    /// Exponential easing rate toward the anchor (1/s)
    pub const EASE_RATE: f32 = 15.0;
}
