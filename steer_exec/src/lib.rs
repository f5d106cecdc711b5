//! # Steering library.
//!
//! This library allows other crates in the workspace, and the tests, to access the items defined
//! inside the steering crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Steering executable parameters
pub mod params;

/// PID controller - converts the cross track error into a steering demand
pub mod pid;

/// Plants - the vehicle being steered, either in the simulator or a kinematic model
pub mod plant;

/// Throttle policy - slows the vehicle down in tight turns
pub mod throttle;

/// Trial - drives the plant for a number of steps and scores the cross track error
pub mod trial;

/// Twiddle - coordinate descent search for the controller gains
pub mod twiddle;
