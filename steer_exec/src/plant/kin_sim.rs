//! Kinematic vehicle model
//!
//! A kinematic bicycle model driving along the line `y = 0`. The cross track error is the lateral
//! position of the vehicle, positive to the left. A positive steering demand turns the vehicle
//! left. A constant steering drift is added to the wheel angle, as a misaligned vehicle would
//! have, so the integral term has something to correct.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Std
use std::convert::Infallible;

// External
use log::trace;
use serde::Deserialize;

// Internal
use super::Plant;
use comms_if::sim::{SimCmd, SimMsg, Telemetry};
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Conversion from meters/second to miles/hour
const MS_TO_MPH: f64 = 2.236_936;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the kinematic model
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct KinSimParams {
    /// Time between steps.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Wheel angle at full steering demand.
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Constant offset added to the wheel angle.
    ///
    /// Units: radians
    pub steering_drift_rad: f64,

    /// Lateral offset from the line at reset.
    ///
    /// Units: meters
    pub init_cte_m: f64,

    /// Heading relative to the line at reset.
    ///
    /// Units: radians
    pub init_heading_rad: f64,

    /// Speed at reset.
    ///
    /// Units: meters/second
    pub init_speed_ms: f64,

    /// Acceleration at full throttle.
    ///
    /// Units: meters/second^2
    pub max_accel_ms2: f64,

    /// Linear drag coefficient.
    ///
    /// Units: 1/second
    pub drag_per_s: f64,
}

/// The kinematic vehicle model.
#[derive(Debug, Clone)]
pub struct KinSim {
    params: KinSimParams,
    state: VehicleState,
}

#[derive(Debug, Clone, Copy)]
struct VehicleState {
    lat_m: f64,
    heading_rad: f64,
    speed_ms: f64,
    steer_dem: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for KinSimParams {
    fn default() -> Self {
        Self {
            dt_s: 0.05,
            wheelbase_m: 2.5,
            max_steer_rad: 25f64.to_radians(),
            steering_drift_rad: 0.02,
            init_cte_m: 1.0,
            init_heading_rad: 0.0,
            init_speed_ms: 10.0,
            max_accel_ms2: 3.0,
            drag_per_s: 0.1,
        }
    }
}

impl VehicleState {
    fn initial(params: &KinSimParams) -> Self {
        Self {
            lat_m: params.init_cte_m,
            heading_rad: params.init_heading_rad,
            speed_ms: params.init_speed_ms,
            steer_dem: 0.0,
        }
    }
}

impl KinSim {
    pub fn new(params: KinSimParams) -> Self {
        Self {
            params,
            state: VehicleState::initial(&params),
        }
    }

    /// Advance the model by one step.
    fn step(&mut self, steer_dem: f64, throttle: f64) {
        let p = &self.params;
        let s = &mut self.state;

        s.steer_dem = clamp(steer_dem, -1.0, 1.0);
        let wheel_angle_rad =
            lin_map((-1.0, 1.0), (-p.max_steer_rad, p.max_steer_rad), s.steer_dem)
            + p.steering_drift_rad;

        s.speed_ms = (s.speed_ms + (throttle * p.max_accel_ms2 - p.drag_per_s * s.speed_ms) * p.dt_s)
            .max(0.0);
        s.heading_rad += s.speed_ms / p.wheelbase_m * wheel_angle_rad.tan() * p.dt_s;
        s.lat_m += s.speed_ms * s.heading_rad.sin() * p.dt_s;

        trace!(
            "KinSim: lat = {:.4} m, heading = {:.4} rad, speed = {:.3} m/s",
            s.lat_m, s.heading_rad, s.speed_ms
        );
    }

    fn telemetry(&self) -> Telemetry {
        Telemetry {
            cte: self.state.lat_m,
            speed_mph: self.state.speed_ms * MS_TO_MPH,
            steering_angle: self.state.steer_dem,
        }
    }
}

impl Plant for KinSim {
    type Error = Infallible;

    fn exchange(&mut self, cmd: &SimCmd) -> Result<SimMsg, Self::Error> {
        match *cmd {
            SimCmd::Reset => self.state = VehicleState::initial(&self.params),
            SimCmd::Steer { steering_angle, throttle } => self.step(steering_angle, throttle),
            SimCmd::Manual => (),
        }

        Ok(SimMsg::Telemetry(self.telemetry()))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
