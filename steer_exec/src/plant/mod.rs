//! # Plants
//!
//! A plant is the vehicle being steered. The controller talks to it in lockstep: every command
//! sent is answered by the next message from the plant.
//!
//! Two plants are provided:
//! - [`SimClient`] drives the vehicle in the driving simulator, via the simulator bridge.
//! - [`KinSim`] is a kinematic vehicle model for running without the simulator.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kin_sim;
mod sim_client;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::{SimCmd, SimMsg};

pub use kin_sim::{KinSim, KinSimParams};
pub use sim_client::{SimClient, SimClientError};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A vehicle which accepts steering commands and reports its cross track error.
pub trait Plant {
    /// An error in communicating with the plant.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a command to the plant and return the next message from it.
    fn exchange(&mut self, cmd: &SimCmd) -> Result<SimMsg, Self::Error>;
}

impl<P: Plant + ?Sized> Plant for &mut P {
    type Error = P::Error;

    fn exchange(&mut self, cmd: &SimCmd) -> Result<SimMsg, Self::Error> {
        (**self).exchange(cmd)
    }
}
