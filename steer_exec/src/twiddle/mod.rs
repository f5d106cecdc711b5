//! # Twiddle
//!
//! Twiddle is a coordinate descent search over a vector of coefficients. It treats the scoring
//! function as a black box and only compares the scores it returns, lower is better.
//!
//! The search starts from the zero vector. Each coefficient has its own step size. On every outer
//! iteration each coefficient in turn is moved up by its step, and if that doesn't strictly
//! improve the best score, down by its step. An improvement is kept and the step grows by 10%,
//! otherwise the coefficient is put back and the step shrinks by 10%. The search has converged
//! once the sum of the step sizes is no greater than the tolerance.
//!
//! This is a local search, the result depends on the initial step sizes and the search may get
//! stuck on a noisy or flat objective. [`Params::max_iters`] bounds the number of iterations.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;

// Internal
pub use params::Params;
use util::maths;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Step size multiplier applied after an improvement.
const STEP_GROWTH: f64 = 1.1;

/// Step size multiplier applied when neither direction improves.
const STEP_DECAY: f64 = 0.9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Progress record written at the start of each outer iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TwiddleIter {
    /// Index of the outer iteration, starting at zero
    pub iteration: usize,

    /// The best score found before this iteration
    pub best_score: f64,

    /// The sum of the step sizes before this iteration
    pub step_sum: f64,
}

/// The state of the search at the point it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct TwiddleProgress<const N: usize> {
    /// The coefficients which produced `best_score`, or the zero vector if nothing was scored
    pub coeffs: [f64; N],

    /// The best score found, or `None` if the starting point could not be scored
    pub best_score: Option<f64>,

    /// Number of completed outer iterations
    pub num_iters: usize,

    /// One record per outer iteration started
    pub history: Vec<TwiddleIter>,
}

/// The result of a converged search.
#[derive(Debug, Clone)]
pub struct Tuned<const N: usize> {
    /// The best coefficients found
    pub coeffs: [f64; N],

    /// The score of `coeffs`
    pub best_score: f64,

    /// Number of completed outer iterations
    pub num_iters: usize,

    /// One record per outer iteration
    pub history: Vec<TwiddleIter>,
}

/// Working state of the search.
struct Search<F, const N: usize> {
    objective: F,

    /// Current coefficients
    p: [f64; N],

    /// Current step sizes
    dp: [f64; N],

    best_coeffs: [f64; N],

    best_score: Option<f64>,

    num_iters: usize,

    history: Vec<TwiddleIter>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which stop the search.
///
/// All errors raised after the search has started carry the progress made up to that point.
#[derive(Debug, thiserror::Error)]
pub enum TwiddleError<E: std::error::Error + 'static, const N: usize> {
    #[error("Step size {index} is {value}, step sizes must be finite and positive")]
    InvalidStepSize { index: usize, value: f64 },

    #[error("The tolerance is {0}, it must be finite and positive")]
    InvalidTolerance(f64),

    #[error("The objective failed for {trial:?}: {source}")]
    Objective {
        source: E,
        trial: [f64; N],
        progress: TwiddleProgress<N>,
    },

    #[error("The objective returned an invalid score ({score}) for {trial:?}")]
    InvalidScore {
        score: f64,
        trial: [f64; N],
        progress: TwiddleProgress<N>,
    },

    #[error(
        "Did not converge within {} iterations (best score {:?} for {:?})",
        .progress.num_iters, .progress.best_score, .progress.coeffs
    )]
    NotConverged { progress: TwiddleProgress<N> },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Search for the coefficients which minimise `objective`.
///
/// `step_sizes` are the initial per-coefficient step sizes, they must all be finite and positive.
/// `objective` must return a finite, non-negative score. Any error it returns aborts the search.
pub fn twiddle<F, E, const N: usize>(
    step_sizes: [f64; N],
    objective: F,
    params: &Params,
) -> Result<Tuned<N>, TwiddleError<E, N>>
where
    F: FnMut(&[f64; N]) -> Result<f64, E>,
    E: std::error::Error + 'static,
{
    for (index, &value) in step_sizes.iter().enumerate() {
        if !(value.is_finite() && value > 0.0) {
            return Err(TwiddleError::InvalidStepSize { index, value });
        }
    }
    if !(params.tolerance.is_finite() && params.tolerance > 0.0) {
        return Err(TwiddleError::InvalidTolerance(params.tolerance));
    }

    Search {
        objective,
        p: [0.0; N],
        dp: step_sizes,
        best_coeffs: [0.0; N],
        best_score: None,
        num_iters: 0,
        history: Vec::new(),
    }
    .run(params)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: std::error::Error + 'static, const N: usize> TwiddleError<E, N> {
    /// The progress made before the search stopped, `None` if the search never started.
    pub fn progress(&self) -> Option<&TwiddleProgress<N>> {
        match self {
            TwiddleError::InvalidStepSize { .. } | TwiddleError::InvalidTolerance(_) => None,
            TwiddleError::Objective { progress, .. }
            | TwiddleError::InvalidScore { progress, .. }
            | TwiddleError::NotConverged { progress } => Some(progress),
        }
    }
}

impl<F, E, const N: usize> Search<F, N>
where
    F: FnMut(&[f64; N]) -> Result<f64, E>,
    E: std::error::Error + 'static,
{
    fn run(mut self, params: &Params) -> Result<Tuned<N>, TwiddleError<E, N>> {
        let mut best_score = self.eval()?;
        self.accept(best_score);

        while maths::sum(&self.dp) > params.tolerance {
            if let Some(max_iters) = params.max_iters {
                if self.num_iters >= max_iters {
                    return Err(TwiddleError::NotConverged {
                        progress: self.progress(),
                    });
                }
            }

            let step_sum = maths::sum(&self.dp);
            info!("Iteration {} best error = {}", self.num_iters, best_score);
            self.history.push(TwiddleIter {
                iteration: self.num_iters,
                best_score,
                step_sum,
            });

            for i in 0..N {
                self.p[i] += self.dp[i];
                let score = self.eval()?;

                if score < best_score {
                    best_score = score;
                    self.accept(score);
                    self.dp[i] *= STEP_GROWTH;
                    continue;
                }

                self.p[i] -= 2.0 * self.dp[i];
                let score = self.eval()?;

                if score < best_score {
                    best_score = score;
                    self.accept(score);
                    self.dp[i] *= STEP_GROWTH;
                } else {
                    // Undo the net -dp of the two trials
                    self.p[i] += self.dp[i];
                    self.dp[i] *= STEP_DECAY;
                }
            }

            self.num_iters += 1;
        }

        info!(
            "Twiddle converged after {} iterations, best error = {}",
            self.num_iters, best_score
        );

        Ok(Tuned {
            coeffs: self.p,
            best_score,
            num_iters: self.num_iters,
            history: self.history,
        })
    }

    /// Score the current coefficients.
    fn eval(&mut self) -> Result<f64, TwiddleError<E, N>> {
        let score = match (self.objective)(&self.p) {
            Ok(s) => s,
            Err(source) => {
                return Err(TwiddleError::Objective {
                    source,
                    trial: self.p,
                    progress: self.progress(),
                })
            }
        };

        trace!("Score for {:?} = {}", self.p, score);

        if !score.is_finite() || score < 0.0 {
            return Err(TwiddleError::InvalidScore {
                score,
                trial: self.p,
                progress: self.progress(),
            });
        }

        Ok(score)
    }

    /// Record the current coefficients as the best so far.
    fn accept(&mut self, score: f64) {
        self.best_coeffs = self.p;
        self.best_score = Some(score);
    }

    fn progress(&self) -> TwiddleProgress<N> {
        TwiddleProgress {
            coeffs: self.best_coeffs,
            best_score: self.best_score,
            num_iters: self.num_iters,
            history: self.history.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug, thiserror::Error)]
    #[error("The run could not be started")]
    struct RunFailed;

    fn quadratic(p: &[f64; 3]) -> f64 {
        (p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2) + (p[2] + 1.0).powi(2)
    }

    fn params(tolerance: f64, max_iters: Option<usize>) -> Params {
        Params { tolerance, max_iters }
    }

    #[test]
    fn test_quadratic_converges() {
        let tuned = twiddle(
            [1.0, 1.0, 1.0],
            |p: &[f64; 3]| Ok::<_, Infallible>(quadratic(p)),
            &params(1e-6, None),
        )
        .unwrap();

        let target = [1.0, 2.0, -1.0];
        for i in 0..3 {
            assert!(
                (tuned.coeffs[i] - target[i]).abs() < 1e-3,
                "coeff {} = {}",
                i,
                tuned.coeffs[i]
            );
        }
        // Restoring a coefficient by adding the step back may round differently
        assert!((tuned.best_score - quadratic(&tuned.coeffs)).abs() < 1e-9);
        assert_eq!(tuned.history.len(), tuned.num_iters);
    }

    #[test]
    fn test_single_coeff() {
        let tuned = twiddle(
            [0.5],
            |p: &[f64; 1]| Ok::<_, Infallible>((p[0] - 3.0).powi(2)),
            &params(1e-6, None),
        )
        .unwrap();

        assert!((tuned.coeffs[0] - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_best_score_is_monotonic() {
        let mut scores = Vec::new();
        let tuned = twiddle(
            [0.3, 0.7, 1.3],
            |p: &[f64; 3]| {
                let s = quadratic(p) + 0.1 * (5.0 * p[0]).sin().abs();
                scores.push(s);
                Ok::<_, Infallible>(s)
            },
            &params(1e-3, None),
        )
        .unwrap();

        for pair in tuned.history.windows(2) {
            assert!(pair[1].best_score <= pair[0].best_score);
        }

        // Only strict improvements are accepted, so the best is the lowest score ever seen
        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(tuned.best_score, min);
        assert_eq!(tuned.history[0].best_score, scores[0]);
    }

    #[test]
    fn test_flat_objective_only_shrinks_steps() {
        let mut num_evals = 0;
        let tuned = twiddle(
            [1.0, 1.0],
            |_: &[f64; 2]| {
                num_evals += 1;
                Ok::<_, Infallible>(5.0)
            },
            &params(0.5, None),
        )
        .unwrap();

        // Ties never count as improvements, so both steps decay by 0.9 per iteration until
        // 2 * 0.9^n <= 0.5
        assert_eq!(tuned.coeffs, [0.0, 0.0]);
        assert_eq!(tuned.best_score, 5.0);
        assert_eq!(tuned.num_iters, 14);
        assert_eq!(num_evals, 1 + 14 * 2 * 2);
        for (i, rec) in tuned.history.iter().enumerate() {
            assert_eq!(rec.iteration, i);
            assert_eq!(rec.best_score, 5.0);
        }
    }

    #[test]
    fn test_failing_objective_aborts() {
        let mut num_evals = 0;
        let result = twiddle(
            [0.2, 0.004, 3.0],
            |_: &[f64; 3]| {
                num_evals += 1;
                Err::<f64, _>(RunFailed)
            },
            &params(0.2, None),
        );

        match result {
            Err(TwiddleError::Objective { trial, progress, .. }) => {
                assert_eq!(trial, [0.0; 3]);
                assert_eq!(progress.num_iters, 0);
                assert_eq!(progress.best_score, None);
            }
            r => panic!("Expected an objective error, got {:?}", r),
        }
        assert_eq!(num_evals, 1);
    }

    #[test]
    fn test_failure_mid_search_keeps_progress() {
        let mut num_evals = 0;
        let result = twiddle(
            [1.0, 1.0, 1.0],
            |p: &[f64; 3]| {
                num_evals += 1;
                if num_evals == 20 {
                    Err(RunFailed)
                } else {
                    Ok(quadratic(p))
                }
            },
            &params(1e-6, None),
        );

        match result {
            Err(TwiddleError::Objective { progress, .. }) => {
                let best = progress.best_score.unwrap();
                assert_eq!(best, quadratic(&progress.coeffs));
                assert!(best < quadratic(&[0.0; 3]));
                // The iteration that failed was started, so has a record
                assert_eq!(progress.history.len(), progress.num_iters + 1);
            }
            r => panic!("Expected an objective error, got {:?}", r),
        }
    }

    #[test]
    fn test_iteration_limit() {
        let result = twiddle(
            [1.0, 1.0, 1.0],
            |p: &[f64; 3]| Ok::<_, Infallible>(quadratic(p)),
            &params(1e-6, Some(5)),
        );

        match result {
            Err(TwiddleError::NotConverged { progress }) => {
                assert_eq!(progress.num_iters, 5);
                assert_eq!(progress.history.len(), 5);
                for (i, rec) in progress.history.iter().enumerate() {
                    assert_eq!(rec.iteration, i);
                }
                assert_eq!(progress.history[0].step_sum, 3.0);
                let best = progress.best_score.unwrap();
                assert_eq!(best, quadratic(&progress.coeffs));
                assert!(best < quadratic(&[0.0; 3]));
            }
            r => panic!("Expected not converged, got {:?}", r),
        }
    }

    #[test]
    fn test_invalid_scores() {
        for &bad in [f64::NAN, -1.0, f64::INFINITY].iter() {
            let result = twiddle(
                [1.0],
                |_: &[f64; 1]| Ok::<_, Infallible>(bad),
                &params(0.1, None),
            );

            assert!(matches!(
                result,
                Err(TwiddleError::InvalidScore { progress: TwiddleProgress { best_score: None, .. }, .. })
            ));
        }
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut called = false;
        let mut objective = |_: &[f64; 3]| {
            called = true;
            Ok::<_, Infallible>(1.0)
        };

        assert!(matches!(
            twiddle([0.2, 0.0, 3.0], &mut objective, &params(0.2, None)),
            Err(TwiddleError::InvalidStepSize { index: 1, .. })
        ));
        assert!(matches!(
            twiddle([-0.2, 0.004, 3.0], &mut objective, &params(0.2, None)),
            Err(TwiddleError::InvalidStepSize { index: 0, .. })
        ));
        assert!(matches!(
            twiddle([0.2, 0.004, f64::NAN], &mut objective, &params(0.2, None)),
            Err(TwiddleError::InvalidStepSize { index: 2, .. })
        ));
        assert!(matches!(
            twiddle([0.2, 0.004, 3.0], &mut objective, &params(0.0, None)),
            Err(TwiddleError::InvalidTolerance(_))
        ));
        assert!(matches!(
            twiddle([0.2, 0.004, 3.0], &mut objective, &params(-1.0, None)),
            Err(TwiddleError::InvalidTolerance(_))
        ));
        assert!(!called);
    }
}
