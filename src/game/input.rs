use rapier3d::prelude::*;
use serde::Deserialize;

use super::constants::physics::EPSILON;

/// Camera heading used to turn stick axes into world directions.
/// Both vectors may carry pitch; it is flattened away.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Heading {
    pub forward: [f32; 3],
    pub right: [f32; 3],
}

impl Heading {
    /// Heading for a yaw angle around +Y (yaw 0 faces +Z, right is -X)
    pub fn from_yaw(yaw: f32) -> Self {
        let (s, c) = yaw.sin_cos();
        Self {
            forward: [s, 0.0, c],
            right: [-c, 0.0, s],
        }
    }

    /// Unit horizontal direction for the given axes, or zero when there is no
    /// input or the heading is vertical.
    pub fn move_direction(&self, forward_axis: f32, strafe_axis: f32) -> Vector<Real> {
        let forward = flatten(vector![self.forward[0], self.forward[1], self.forward[2]]);
        let right = flatten(vector![self.right[0], self.right[1], self.right[2]]);
        let wish = forward * forward_axis.clamp(-1.0, 1.0) + right * strafe_axis.clamp(-1.0, 1.0);
        wish.try_normalize(EPSILON).unwrap_or_else(Vector::zeros)
    }
}

/// Drops the vertical component and renormalizes; zero if nothing is left.
pub fn flatten(v: Vector<Real>) -> Vector<Real> {
    vector![v.x, 0.0, v.z]
        .try_normalize(EPSILON)
        .unwrap_or_else(Vector::zeros)
}

/// Where the player is looking from, for aimed grabs and push-off
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ViewRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
}

impl ViewRay {
    pub fn origin(&self) -> Point<Real> {
        point![self.origin[0], self.origin[1], self.origin[2]]
    }

    pub fn direction(&self) -> Vector<Real> {
        vector![self.direction[0], self.direction[1], self.direction[2]]
    }
}

/// Input sampled for one tick: edge-triggered buttons plus held axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickInput {
    pub forward: f32,
    pub strafe: f32,
    pub jump: bool,
    pub crouch_toggle: bool,
    pub grab_toggle: bool,
    pub push: bool,
    pub gravity_toggle: bool,
    pub heading: Option<Heading>,
    pub view: Option<ViewRay>,
}

impl TickInput {
    pub fn has_move_input(&self) -> bool {
        self.forward.abs() > EPSILON || self.strafe.abs() > EPSILON
    }

    /// Move direction, zero if no heading was supplied
    pub fn move_direction(&self) -> Vector<Real> {
        match &self.heading {
            Some(heading) => heading.move_direction(self.forward, self.strafe),
            None => Vector::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_direction_discards_pitch() {
        let heading = Heading {
            forward: [0.0, -0.8, 0.6],
            right: [-1.0, 0.0, 0.0],
        };
        let dir = heading.move_direction(1.0, 0.0);
        assert!((dir - vector![0.0, 0.0, 1.0]).norm() < 1e-5);
    }

    #[test]
    fn test_diagonal_is_unit_length() {
        let dir = Heading::from_yaw(0.0).move_direction(1.0, 1.0);
        assert!((dir.norm() - 1.0).abs() < 1e-5);
        assert!(dir.y.abs() < 1e-6);
    }

    #[test]
    fn test_missing_heading_gives_zero() {
        let input = TickInput {
            forward: 1.0,
            ..Default::default()
        };
        assert!(input.has_move_input());
        assert_eq!(input.move_direction(), Vector::zeros());
    }

    #[test]
    fn test_vertical_heading_gives_zero() {
        let heading = Heading {
            forward: [0.0, 1.0, 0.0],
            right: [0.0, 0.0, 0.0],
        };
        assert_eq!(heading.move_direction(1.0, 0.0), Vector::zeros());
    }

    #[test]
    fn test_deserialize_sparse_tick() {
        let input: TickInput = serde_json::from_str(r#"{"forward": 1.0, "jump": true}"#).unwrap();
        assert!(input.jump);
        assert!(!input.push);
        assert!(input.heading.is_none());
    }
}
