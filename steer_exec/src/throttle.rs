//! # Throttle policy
//!
//! Below the braking speed the vehicle is driven at full throttle. Above it, throttle is reduced
//! in proportion to speed and steering demand so the vehicle doesn't lose control in tight turns,
//! down to the maximum brake demand. The vehicle never brakes below the braking speed as that
//! would reverse it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Throttle policy parameters.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// Speed above which the throttle is reduced and braking is allowed.
    ///
    /// Units: miles/hour
    pub brake_speed_mph: f64,

    /// Speed scale of the throttle reduction.
    ///
    /// Units: miles/hour
    pub speed_scale_mph: f64,

    /// Gain applied to the magnitude of the steering demand.
    pub steer_gain: f64,

    /// The strongest brake demand, a negative throttle.
    pub max_brake: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            brake_speed_mph: 20.0,
            speed_scale_mph: 60.0,
            steer_gain: 5.0,
            max_brake: -1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the throttle demand for the current speed and steering demand.
pub fn throttle_dem(speed_mph: f64, steer_dem: f64, params: &Params) -> f64 {
    if speed_mph > params.brake_speed_mph {
        let reduced = 1.0 - (speed_mph / params.speed_scale_mph * steer_dem.abs() * params.steer_gain);
        reduced.max(params.max_brake)
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_throttle_below_brake_speed() {
        let params = Params::default();

        assert_eq!(throttle_dem(0.0, 0.0, &params), 1.0);
        assert_eq!(throttle_dem(15.0, 1.0, &params), 1.0);
        assert_eq!(throttle_dem(20.0, -1.0, &params), 1.0);
    }

    #[test]
    fn test_reduced_above_brake_speed() {
        let params = Params::default();

        // 1 - 30/60 * 0.2 * 5 = 0.5
        assert!((throttle_dem(30.0, 0.2, &params) - 0.5).abs() < 1e-12);
        assert!((throttle_dem(30.0, -0.2, &params) - 0.5).abs() < 1e-12);
        assert_eq!(throttle_dem(30.0, 0.0, &params), 1.0);
    }

    #[test]
    fn test_brake_limited() {
        let params = Params::default();

        assert_eq!(throttle_dem(60.0, 1.0, &params), -1.0);

        let gentle = Params { max_brake: -0.25, ..params };
        assert_eq!(throttle_dem(60.0, 1.0, &gentle), -0.25);
    }
}
