//! # PID controller
//!
//! The steering controller converts a stream of cross track error samples into a stream of
//! steering corrections:
//!
//! ```text
//! correction = -(k_p * e + k_d * (e - e_prev) + k_i * sum(e))
//! ```
//!
//! The derivative is the difference between consecutive samples and the integral is the plain sum
//! of all samples since initialisation, neither is scaled by time. The integral is never clamped,
//! so long runs will wind up; callers bound the run length instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The three gains of a PID controller.
///
/// As a coefficient vector the gains are ordered `[k_p, k_i, k_d]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

/// The error memory of a PID controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorTerms {
    /// The last error sample seen
    pub prev: f64,

    /// The sum of all error samples since initialisation
    pub integral: f64,

    /// Difference between the last two error samples
    pub derivative: f64,
}

/// A PID controller.
///
/// The controller must be initialised with [`PidController::init`] before any other operation,
/// otherwise they return [`PidError::NotInitialised`].
#[derive(Debug, Default, Clone)]
pub struct PidController {
    state: PidState,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum PidState {
    Uninitialised,
    Ready {
        gains: Gains,
        errors: ErrorTerms,
    },
}

/// Errors which can occur during PID processing.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PidError {
    #[error("The PID controller has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }
}

impl From<[f64; 3]> for Gains {
    fn from(coeffs: [f64; 3]) -> Self {
        Self::new(coeffs[0], coeffs[1], coeffs[2])
    }
}

impl From<Gains> for [f64; 3] {
    fn from(gains: Gains) -> Self {
        [gains.k_p, gains.k_i, gains.k_d]
    }
}

impl Default for PidState {
    fn default() -> Self {
        PidState::Uninitialised
    }
}

impl PidController {
    /// Create a controller which is already initialised with the given gains.
    pub fn with_gains(gains: Gains) -> Self {
        let mut pid = Self::default();
        pid.init(gains.k_p, gains.k_i, gains.k_d);
        pid
    }

    /// Initialise the controller, setting the gains and zeroing all errors.
    ///
    /// The gains are not validated, zero and negative gains are accepted.
    pub fn init(&mut self, k_p: f64, k_i: f64, k_d: f64) {
        self.state = PidState::Ready {
            gains: Gains::new(k_p, k_i, k_d),
            errors: ErrorTerms::default(),
        };
    }

    /// Update the error terms with the latest cross track error sample.
    ///
    /// Must be called exactly once per sample, in sample order.
    pub fn update_error(&mut self, cte: f64) -> Result<(), PidError> {
        match self.state {
            PidState::Ready { ref mut errors, .. } => {
                errors.derivative = cte - errors.prev;
                errors.prev = cte;
                errors.integral += cte;
                Ok(())
            }
            PidState::Uninitialised => Err(PidError::NotInitialised),
        }
    }

    /// Get the correction for the current error terms.
    pub fn total_error(&self) -> Result<f64, PidError> {
        match self.state {
            PidState::Ready { gains, errors } => Ok(-(gains.k_p * errors.prev
                + gains.k_d * errors.derivative
                + gains.k_i * errors.integral)),
            PidState::Uninitialised => Err(PidError::NotInitialised),
        }
    }

    /// The current error terms, or `None` if not initialised.
    pub fn errors(&self) -> Option<ErrorTerms> {
        match self.state {
            PidState::Ready { errors, .. } => Some(errors),
            PidState::Uninitialised => None,
        }
    }

    /// The gains, or `None` if not initialised.
    pub fn gains(&self) -> Option<Gains> {
        match self.state {
            PidState::Ready { gains, .. } => Some(gains),
            PidState::Uninitialised => None,
        }
    }

    pub fn is_init(&self) -> bool {
        matches!(self.state, PidState::Ready { .. })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialised() {
        let mut pid = PidController::default();

        assert!(!pid.is_init());
        assert_eq!(pid.update_error(1.0), Err(PidError::NotInitialised));
        assert_eq!(pid.total_error(), Err(PidError::NotInitialised));
        assert_eq!(pid.errors(), None);
        assert_eq!(pid.gains(), None);
    }

    #[test]
    fn test_first_sample() {
        let cases = [
            (0.5, 0.01, 2.0, 3.0),
            (-1.0, 0.0, 0.25, -0.75),
            (0.0, 1.0, 0.0, 12.5),
            (2.0, -0.5, 1.5, 0.0),
        ];

        for &(k_p, k_i, k_d, cte) in cases.iter() {
            let mut pid = PidController::default();
            pid.init(k_p, k_i, k_d);
            pid.update_error(cte).unwrap();

            // All error terms equal the sample after the first update
            let expected = -(k_p * cte + k_d * cte + k_i * cte);
            assert!((pid.total_error().unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_errors() {
        let mut pid = PidController::with_gains(Gains::new(0.3, 0.02, 4.0));

        for _ in 0..10 {
            pid.update_error(-2.5).unwrap();
        }

        let errors = pid.errors().unwrap();
        assert_eq!(errors.integral, -25.0);
        assert_eq!(errors.derivative, 0.0);
        assert_eq!(errors.prev, -2.5);
    }

    #[test]
    fn test_total_error_idempotent() {
        let mut pid = PidController::with_gains(Gains::new(0.2, 0.004, 3.0));
        pid.update_error(0.7).unwrap();
        pid.update_error(0.4).unwrap();

        let first = pid.total_error().unwrap();
        let second = pid.total_error().unwrap();
        assert_eq!(first, second);
        assert_eq!(pid.errors().unwrap().derivative, 0.4 - 0.7);
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::default();
        pid.init(1.0, 0.0, 0.0);

        for &cte in [5.0, 5.0, 5.0].iter() {
            pid.update_error(cte).unwrap();
            assert_eq!(pid.total_error().unwrap(), -5.0);
        }
    }

    #[test]
    fn test_derivative_only() {
        let mut pid = PidController::default();
        pid.init(0.0, 0.0, 1.0);

        pid.update_error(3.0).unwrap();
        assert_eq!(pid.total_error().unwrap(), -3.0);

        pid.update_error(7.0).unwrap();
        assert_eq!(pid.total_error().unwrap(), -4.0);
    }

    #[test]
    fn test_reinit_clears_errors() {
        let mut pid = PidController::with_gains(Gains::new(1.0, 1.0, 1.0));
        pid.update_error(10.0).unwrap();

        pid.init(0.5, 0.0, 0.0);
        assert_eq!(pid.errors(), Some(ErrorTerms::default()));
        assert_eq!(pid.gains(), Some(Gains::new(0.5, 0.0, 0.0)));
        assert_eq!(pid.total_error().unwrap(), 0.0);
    }

    #[test]
    fn test_gains_coeff_order() {
        let gains = Gains::from([0.45988, 0.00323188, 14.2266]);
        assert_eq!(gains.k_p, 0.45988);
        assert_eq!(gains.k_i, 0.00323188);
        assert_eq!(gains.k_d, 14.2266);
        assert_eq!(<[f64; 3]>::from(gains), [0.45988, 0.00323188, 14.2266]);
    }
}
