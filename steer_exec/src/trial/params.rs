//! Trial parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a single trial.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// Number of telemetry steps after which the trial ends. If `None` the trial runs until the
    /// plant fails.
    #[serde(default)]
    pub num_steps: Option<usize>,

    /// Number of steps at the start of the trial which don't contribute to the score, allowing the
    /// controller to settle.
    #[serde(default)]
    pub warm_up_steps: usize,
}
