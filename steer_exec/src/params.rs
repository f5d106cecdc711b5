//! Parameters for the steering executable, loaded from `steer_exec.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::{pid::Gains, plant::KinSimParams, throttle, trial, twiddle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steering executable parameters
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Controller gains used in a single run
    pub gains: Gains,

    /// Trial parameters of a single run
    pub run: trial::Params,

    pub tune: TuneParams,

    /// Convergence parameters of the twiddle search
    pub twiddle: twiddle::Params,

    #[serde(default)]
    pub throttle: throttle::Params,

    #[serde(default)]
    pub kin_sim: KinSimParams,
}

/// Parameters of a tuning run.
#[derive(Deserialize, Debug, Clone)]
pub struct TuneParams {
    /// Initial step sizes of `[k_p, k_i, k_d]`
    pub init_step_sizes: [f64; 3],

    /// Parameters of each trial scored by twiddle
    pub trial: trial::Params,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: Params =
            util::params::from_str(include_str!("../../params/steer_exec.toml")).unwrap();

        assert_eq!(params.gains, Gains::new(0.45988, 0.00323188, 14.2266));
        assert_eq!(params.tune.init_step_sizes, [0.2, 0.004, 3.0]);
        assert_eq!(params.tune.trial.num_steps, Some(1000));
        assert_eq!(params.tune.trial.warm_up_steps, 500);
        assert_eq!(params.twiddle.tolerance, 0.2);
        assert_eq!(params.throttle, throttle::Params::default());
        assert_eq!(params.kin_sim.dt_s, 0.05);
        assert_eq!(params.kin_sim.init_cte_m, 1.0);
    }

    #[test]
    fn test_defaults() {
        let params: Params = util::params::from_str(
            r#"
            [gains]
            k_p = 0.1
            k_i = 0.0
            k_d = 1.0

            [run]

            [tune]
            init_step_sizes = [1.0, 1.0, 1.0]

            [tune.trial]
            num_steps = 10

            [twiddle]
            tolerance = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(params.run.num_steps, None);
        assert_eq!(params.run.warm_up_steps, 0);
        assert_eq!(params.twiddle.max_iters, None);
        assert_eq!(params.throttle, throttle::Params::default());
    }
}
