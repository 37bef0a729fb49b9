//! # Rover Executable Parameters
//!
//! This module provide parameters for the rover executable, loaded from `rov_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::{Deserialize, Serialize};

use crate::{dispatcher::DispatcherParams, vehicle_link::VehicleLinkParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RovExecParams {
    /// MAVLink connection string of the vehicle, e.g. `"udpin:0.0.0.0:14550"`
    pub mavlink_endpoint: String,

    /// Target period of one cycle of the main loop.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Side-channel server endpoints
    pub net: NetParams,

    pub dispatcher: DispatcherParams,

    pub link: VehicleLinkParams,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
