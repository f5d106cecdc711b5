//! Twiddle parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters controlling when the twiddle search stops.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Params {
    /// The search has converged once the sum of the step sizes falls to or below this value.
    ///
    /// Make this larger if the search takes too long.
    pub tolerance: f64,

    /// Maximum number of outer iterations before giving up, or `None` to search until
    /// convergence.
    #[serde(default)]
    pub max_iters: Option<usize>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            tolerance: 0.2,
            max_iters: None,
        }
    }
}
