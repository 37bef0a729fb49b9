//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface. A TC is an instruction from the operator (or a script standing in for them) to the
//! vehicle executable.
//!
//! TCs are JSON objects with a `type` and an optional `payload`:
//!
//! ```text
//! {"type": "SET_RELAY", "payload": {"relay": "lights", "enabled": true}}
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use thiserror::Error;

// Internal
use crate::{
    eqpt::{cam::CamId, per::TargetObservation, relay::RelayId},
    vehicle::InputChannel,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the vehicle by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tc {
    /// Arm the vehicle
    Arm,

    /// Disarm the vehicle, switching off all relays first
    Disarm,

    /// Change the vehicle's flight mode by name
    SetMode(String),

    /// Switch a relay on or off
    SetRelay {
        relay: RelayId,
        enabled: bool
    },

    /// Enable or disable a camera stream
    SetCamera {
        camera: CamId,
        enabled: bool
    },

    /// Demand normalised inputs on the given axes, each between -1 and 1
    SetInputs(BTreeMap<InputChannel, f64>),

    /// Zero all six axes
    StopThrusters,

    /// Start an autonomous task, aborting any running task first
    StartTask(TaskKind),

    /// Abort the running autonomous task
    AbortTask,

    /// Inject a perception observation, used to replay recorded runs
    Observation(TargetObservation),
}

/// Autonomous tasks which can be started by TC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Visual servo onto a button and push it
    ButtonDocking,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
