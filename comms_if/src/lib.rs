//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the vehicle protocol
//! messages, the relay and camera side-channel payloads, and operator telecommands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and response definitions for equipment (relays, cameras, perception)
pub mod eqpt;

/// Network module
pub mod net;

/// Vehicle (autopilot) protocol definitions
pub mod vehicle;
