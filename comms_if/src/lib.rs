//! # Communications interface crate.
//!
//! Provides the interface between the steering software and the driving simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Messages exchanged with the simulator and their frame encoding
pub mod sim;

/// Network module
pub mod net;
