//! # Vehicle IO
//!
//! The [`VehicleIo`] trait is the boundary between the control core and the protocol used to talk
//! to the vehicle's autopilot. Everything above it deals in the plain message types of
//! [`comms_if::vehicle`]. All reads are non-blocking.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

#[cfg(feature = "mavlink-link")]
pub mod mavlink_io;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::vehicle::{Heartbeat, ModeMapping, RcOverride, Telemetry};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A handle to the vehicle's autopilot.
pub trait VehicleIo: Send {
    /// Get the next pending heartbeat, if there is one.
    fn try_recv_heartbeat(&mut self) -> Option<Heartbeat>;

    /// Get the next pending telemetry message, if there is one.
    fn try_recv_telemetry(&mut self) -> Option<Telemetry>;

    fn send_rc_override(&mut self, cmd: &RcOverride) -> Result<(), LinkIoError>;

    /// Request the vehicle arms (`true`) or disarms (`false`).
    fn send_arm(&mut self, arm: bool) -> Result<(), LinkIoError>;

    /// Request the vehicle switches to the mode with the given custom mode id.
    fn send_mode(&mut self, mode_id: u32) -> Result<(), LinkIoError>;

    /// The name to id table of modes this vehicle accepts.
    fn mode_mapping(&self) -> &ModeMapping;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LinkIoError {
    #[error("Could not open the vehicle link at \"{0}\": {1}")]
    ConnectError(String, std::io::Error),

    #[error("Could not send {0} to the vehicle: {1}")]
    SendError(&'static str, String),
}
