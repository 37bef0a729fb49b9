//! # ROV library.
//!
//! This library allows other crates in the workspace to access items defined inside the ROV
//! executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator interface - validates control intents and converts them into RC override commands
pub mod actuator;

/// Time sources used for all timeouts
pub mod clock;

/// Side-channel dispatcher - sends relay and camera commands from a worker pool
pub mod dispatcher;

/// Vehicle IO - the protocol level connection to the vehicle's autopilot
pub mod link;

/// Executable parameters
pub mod params;

/// Perception feed - carries target observations from the perception routine to tasks
pub mod perception;

/// Autonomous tasks and the task runner
pub mod task;

/// Telecommand processing
pub mod tc_processor;

/// Vehicle link - connection, arm and mode state of the vehicle, and all commands to it
pub mod vehicle_link;

#[cfg(test)]
pub(crate) mod fakes;
