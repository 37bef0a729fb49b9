//! # Vehicle Protocol Interface
//!
//! Definitions of the messages exchanged with the vehicle's autopilot, independent of the
//! transport used to carry them. The control core only ever sees these types, the MAVLink
//! adapter in `rov_exec` converts to and from the wire representation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest PWM value the vehicle will accept on an RC channel.
///
/// Units: microseconds
pub const PWM_MIN: i32 = 1100;

/// Highest PWM value the vehicle will accept on an RC channel.
///
/// Units: microseconds
pub const PWM_MAX: i32 = 1900;

/// PWM value corresponding to a zero normalised input.
///
/// Units: microseconds
pub const PWM_NEUTRAL: f64 = 1500.0;

/// PWM change corresponding to a normalised input of 1.
///
/// Units: microseconds
pub const PWM_SCALE: f64 = 400.0;

/// Number of channels in an RC override command.
pub const NUM_RC_CHANNELS: usize = 18;

/// Lowest addressable physical channel id.
pub const CHANNEL_ID_MIN: i32 = 1;

/// Highest addressable physical channel id.
pub const CHANNEL_ID_MAX: i32 = NUM_RC_CHANNELS as i32;

/// Value of an RC override slot which the vehicle must leave unaffected.
pub const RC_IGNORE: u16 = 65535;

/// Bit in the heartbeat base mode which is set while the vehicle is armed.
pub const BASE_MODE_ARMED_FLAG: u8 = 0x80;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Status message periodically sent by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Base mode bitmask
    pub base_mode: u8,

    /// Autopilot specific flight mode id
    pub custom_mode: u32,
}

/// Optional telemetry sent by the vehicle alongside heartbeats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Altitude reported by the vehicle, negative below the surface.
    ///
    /// Units: meters
    pub altitude_m: f32,
}

/// RC override command, one slot per physical channel.
///
/// Slot `i` holds the PWM for channel id `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcOverride {
    pub channels: [u16; NUM_RC_CHANNELS],
}

/// Bidirectional mapping between flight mode names and the autopilot's custom mode ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeMapping {
    by_name: BTreeMap<String, u32>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Logical control axes of the vehicle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize
)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    Pitch,
    Roll,
    Throttle,
    Yaw,
    Forward,
    Lateral,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Heartbeat {
    /// Returns true if the armed bit is set in the base mode.
    pub fn is_armed(&self) -> bool {
        self.base_mode & BASE_MODE_ARMED_FLAG == BASE_MODE_ARMED_FLAG
    }
}

impl RcOverride {
    /// Create a command which leaves every channel unaffected.
    pub fn ignore_all() -> Self {
        Self {
            channels: [RC_IGNORE; NUM_RC_CHANNELS]
        }
    }

    /// Set the PWM of a physical channel.
    ///
    /// The channel id must already have been validated against `CHANNEL_ID_MIN` and
    /// `CHANNEL_ID_MAX`, ids outside this range are ignored.
    pub fn set(&mut self, channel_id: i32, pwm: u16) {
        if channel_id >= CHANNEL_ID_MIN && channel_id <= CHANNEL_ID_MAX {
            self.channels[(channel_id - 1) as usize] = pwm;
        }
    }

    /// Get the PWM of a physical channel, `None` if the channel is ignored or doesn't exist.
    pub fn get(&self, channel_id: i32) -> Option<u16> {
        if channel_id < CHANNEL_ID_MIN || channel_id > CHANNEL_ID_MAX {
            return None
        }

        match self.channels[(channel_id - 1) as usize] {
            RC_IGNORE => None,
            pwm => Some(pwm)
        }
    }
}

impl Default for RcOverride {
    fn default() -> Self {
        Self::ignore_all()
    }
}

impl InputChannel {
    /// All logical axes, in physical channel order.
    pub const ALL: [InputChannel; 6] = [
        InputChannel::Pitch,
        InputChannel::Roll,
        InputChannel::Throttle,
        InputChannel::Yaw,
        InputChannel::Forward,
        InputChannel::Lateral,
    ];

    /// The physical RC channel id this axis is mapped to.
    pub fn channel_id(&self) -> i32 {
        match self {
            InputChannel::Pitch => 1,
            InputChannel::Roll => 2,
            InputChannel::Throttle => 3,
            InputChannel::Yaw => 4,
            InputChannel::Forward => 5,
            InputChannel::Lateral => 6,
        }
    }
}

impl fmt::Display for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ModeMapping {
    /// The ArduSub custom mode table.
    pub fn ardusub() -> Self {
        [
            ("STABILIZE", 0),
            ("ACRO", 1),
            ("ALT_HOLD", 2),
            ("AUTO", 3),
            ("GUIDED", 4),
            ("CIRCLE", 7),
            ("SURFACE", 9),
            ("POSHOLD", 16),
            ("MANUAL", 19),
        ]
        .iter()
        .map(|(n, id)| (n.to_string(), *id))
        .collect()
    }

    /// Get the id of the named mode.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Get the name of the mode with the given id.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, &i)| i == id)
            .map(|(n, _)| n.as_str())
    }

    /// Iterate over all known mode names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(|n| n.as_str())
    }
}

impl std::iter::FromIterator<(String, u32)> for ModeMapping {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            by_name: iter.into_iter().collect()
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
