//! # Steering Executable
//!
//! Steers a vehicle along the lane centre with a PID controller acting on the cross track error.
//!
//! The executable runs in one of two modes:
//!
//!     - Single run: drive with the configured gains, archiving every step to `arch/steps.csv`.
//!     - Tuning run (`--tune`): search for the gains with twiddle, scoring each candidate with a
//!       trial. The progress of the search is archived to `arch/twiddle.csv` and the best gains
//!       are saved to `tuned_gains.json`.
//!
//! By default the vehicle is the one in the driving simulator, reached through the simulator
//! bridge at the endpoint in `net.toml`. `--offline` drives a kinematic vehicle model instead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Result};
use comms_if::net::{zmq, NetParams};
use log::{debug, error, info, warn};
use serde::Serialize;
use structopt::StructOpt;

// Internal
use steer_lib::{
    params::Params,
    pid::Gains,
    plant::{KinSim, Plant, SimClient},
    trial::TrialRunner,
    twiddle::{self, TwiddleIter, TwiddleProgress},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "steer_exec", about = "PID steering controller and gain tuner")]
struct Opts {
    /// Search for the controller gains with twiddle instead of driving a single run
    #[structopt(long)]
    tune: bool,

    /// Drive the kinematic vehicle model instead of the simulator
    #[structopt(long)]
    offline: bool,

    /// Parameter file, relative to the params directory
    #[structopt(long, default_value = "steer_exec.toml")]
    params: String,
}

/// Result of a tuning run, saved into the session.
#[derive(Debug, Serialize)]
struct TunedGains {
    gains: Gains,
    best_score: Option<f64>,
    num_iters: usize,
    converged: bool,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("steer_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Steering Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: Params = util::params::load(&opts.params)
        .wrap_err("Could not load the steering parameters")?;

    info!("Parameters loaded");

    // ---- PLANT INITIALISATION ----

    let result = if opts.offline {
        info!("Driving the kinematic vehicle model");
        execute(KinSim::new(params.kin_sim), &opts, &params, &session)
    } else {
        let net_params: NetParams = util::params::load("net.toml")
            .wrap_err("Could not load the network parameters")?;

        let ctx = zmq::Context::new();
        let sim_client = SimClient::new(&ctx, &net_params)
            .wrap_err("Failed to initialise the simulator client")?;

        execute(sim_client, &opts, &params, &session)
    };

    // Wait for any results to be written
    session.exit();

    result
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn execute<P: Plant>(plant: P, opts: &Opts, params: &Params, session: &Session) -> Result<()> {
    match opts.tune {
        true => tune(plant, params, session),
        false => {
            if opts.offline && params.run.num_steps.is_none() {
                return Err(eyre!("An offline run must set run.num_steps"));
            }
            single_run(plant, params, session)
        }
    }
}

/// Drive the plant with the configured gains.
fn single_run<P: Plant>(plant: P, params: &Params, session: &Session) -> Result<()> {
    let mut arch = Archiver::from_path(session, "steps.csv")
        .wrap_err("Failed to create the step archive")?;

    info!("Starting run with {:?}", params.gains);

    let mut runner = TrialRunner::new(plant, params.run, params.throttle);
    let result = runner.run_observed(params.gains, |rec| {
        debug!(
            "CTE: {} Steering Value: {} Throttle: {}",
            rec.cte, rec.steering_angle, rec.throttle
        );
        if let Err(e) = arch.serialise(rec) {
            warn!("Could not archive step {}: {}", rec.step, e);
        }
    });

    match result {
        Ok(report) => {
            info!(
                "Run complete after {} steps, total error = {}",
                report.num_steps, report.score
            );
            Ok(())
        }
        Err(e) => {
            if let Some(report) = e.report() {
                error!(
                    "Run stopped after {} steps, total error = {}",
                    report.num_steps, report.score
                );
            }
            Err(e).wrap_err("The run failed")
        }
    }
}

/// Search for the gains which minimise the trial score.
fn tune<P: Plant>(plant: P, params: &Params, session: &Session) -> Result<()> {
    let mut arch = Archiver::from_path(session, "twiddle.csv")
        .wrap_err("Failed to create the twiddle archive")?;

    info!(
        "Starting tuning with step sizes {:?}, tolerance {}",
        params.tune.init_step_sizes, params.twiddle.tolerance
    );

    let mut runner = TrialRunner::new(plant, params.tune.trial, params.throttle);
    let result = twiddle::twiddle(
        params.tune.init_step_sizes,
        |p| {
            runner.score(p).map(|score| {
                info!("Trial {:?}: total error = {}", p, score);
                score
            })
        },
        &params.twiddle,
    );

    match result {
        Ok(tuned) => {
            archive_history(&mut arch, &tuned.history);

            let gains = Gains::from(tuned.coeffs);
            info!("Tuned {:?}, best error = {}", gains, tuned.best_score);

            session.save(
                "tuned_gains.json",
                TunedGains {
                    gains,
                    best_score: Some(tuned.best_score),
                    num_iters: tuned.num_iters,
                    converged: true,
                },
            );

            Ok(())
        }
        Err(e) => {
            if let Some(progress) = e.progress() {
                archive_history(&mut arch, &progress.history);
                save_partial(progress, session);
            }
            Err(e).wrap_err("Tuning failed")
        }
    }
}

/// Write the twiddle iteration records to the archive.
fn archive_history(arch: &mut Archiver, history: &[TwiddleIter]) {
    for rec in history {
        if let Err(e) = arch.serialise(rec) {
            warn!("Could not archive iteration {}: {}", rec.iteration, e);
        }
    }
}

/// Report the best gains found by a search which did not converge.
fn save_partial(progress: &TwiddleProgress<3>, session: &Session) {
    let gains = Gains::from(progress.coeffs);

    match progress.best_score {
        Some(score) => error!(
            "Tuning stopped after {} iterations, best so far {:?} with error {}",
            progress.num_iters, gains, score
        ),
        None => {
            error!("Tuning stopped before any trial was scored");
            return;
        }
    }

    session.save(
        "tuned_gains.json",
        TunedGains {
            gains,
            best_score: progress.best_score,
            num_iters: progress.num_iters,
            converged: false,
        },
    );
}
