//! # Trial
//!
//! A trial drives the plant with a fresh controller for a number of steps and scores the squared
//! cross track error over the steps after the warm up. A trial is the objective which twiddle
//! minimises.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
pub use params::Params;
use crate::{
    pid::{Gains, PidController, PidError},
    plant::Plant,
    throttle,
};
use comms_if::sim::{SimCmd, SimMsg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Record of one step of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    /// Index of the step, starting at one
    pub step: usize,

    /// The cross track error reported by the plant
    pub cte: f64,

    /// The steering demand sent to the plant
    pub steering_angle: f64,

    /// The throttle demand sent to the plant
    pub throttle: f64,

    /// The speed reported by the plant
    pub speed_mph: f64,
}

/// Summary of a completed trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialReport {
    /// Sum of the squared cross track error over the scored steps
    pub score: f64,

    /// Number of telemetry steps taken
    pub num_steps: usize,

    /// Number of steps which contributed to the score
    pub num_scored_steps: usize,
}

/// Runs trials against a plant.
pub struct TrialRunner<P> {
    plant: P,
    params: Params,
    throttle_params: throttle::Params,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrialError<E: std::error::Error + 'static> {
    #[error("The trial could not be started: {0}")]
    Start(E),

    #[error("Controller error: {0}")]
    Pid(#[from] PidError),

    /// The plant failed after the trial started, `report` holds the steps taken until then.
    #[error("Plant error at step {}: {source}", .report.num_steps)]
    Plant { report: TrialReport, source: E },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run a single trial.
///
/// The plant is reset and driven by a new controller with the given gains. `observer` is called
/// after each step is commanded.
pub fn run_trial<P, O>(
    plant: &mut P,
    gains: Gains,
    params: &Params,
    throttle_params: &throttle::Params,
    mut observer: O,
) -> Result<TrialReport, TrialError<P::Error>>
where
    P: Plant,
    O: FnMut(&StepRecord),
{
    debug!("Starting trial with {:?}", gains);

    let mut msg = plant.exchange(&SimCmd::Reset).map_err(TrialError::Start)?;

    let mut pid = PidController::with_gains(gains);
    let mut report = TrialReport {
        score: 0.0,
        num_steps: 0,
        num_scored_steps: 0,
    };

    loop {
        let cmd = match msg {
            SimMsg::Telemetry(telem) => {
                report.num_steps += 1;

                pid.update_error(telem.cte)?;
                let steering_angle = pid.total_error()?;
                let throttle = throttle::throttle_dem(telem.speed_mph, steering_angle, throttle_params);

                if report.num_steps > params.warm_up_steps {
                    report.score += telem.cte.powi(2);
                    report.num_scored_steps += 1;
                }

                trace!("CTE: {} Steering Value: {}", telem.cte, steering_angle);

                observer(&StepRecord {
                    step: report.num_steps,
                    cte: telem.cte,
                    steering_angle,
                    throttle,
                    speed_mph: telem.speed_mph,
                });

                SimCmd::Steer {
                    steering_angle,
                    throttle,
                }
            }
            SimMsg::Manual => SimCmd::Manual,
        };

        let reply = match plant.exchange(&cmd) {
            Ok(r) => r,
            Err(source) => return Err(TrialError::Plant { report, source }),
        };

        if let Some(num_steps) = params.num_steps {
            if report.num_steps >= num_steps {
                break;
            }
        }

        msg = reply;
    }

    debug!(
        "Trial finished after {} steps, total error = {}",
        report.num_steps, report.score
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: std::error::Error + 'static> TrialError<E> {
    /// The steps taken before the plant failed, if the trial had started.
    pub fn report(&self) -> Option<&TrialReport> {
        match self {
            TrialError::Plant { report, .. } => Some(report),
            _ => None,
        }
    }
}

impl<P: Plant> TrialRunner<P> {
    pub fn new(plant: P, params: Params, throttle_params: throttle::Params) -> Self {
        Self {
            plant,
            params,
            throttle_params,
        }
    }

    /// Run a trial with the given gains.
    pub fn run(&mut self, gains: Gains) -> Result<TrialReport, TrialError<P::Error>> {
        self.run_observed(gains, |_| ())
    }

    /// Run a trial with the given gains, passing each step to `observer`.
    pub fn run_observed<O>(&mut self, gains: Gains, observer: O) -> Result<TrialReport, TrialError<P::Error>>
    where
        O: FnMut(&StepRecord),
    {
        run_trial(
            &mut self.plant,
            gains,
            &self.params,
            &self.throttle_params,
            observer,
        )
    }

    /// Score a coefficient vector `[k_p, k_i, k_d]`, for use as the twiddle objective.
    pub fn score(&mut self, coeffs: &[f64; 3]) -> Result<f64, TrialError<P::Error>> {
        let report = self.run(Gains::from(*coeffs))?;
        Ok(report.score)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
