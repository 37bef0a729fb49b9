//! # Relay Equipment Commands
//!
//! Relays are switched by a small server on the vehicle's companion computer. Each command is a
//! two byte payload `[relay_id, enabled]` sent over its own TCP connection.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command setting the absolute state of one relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCmd {
    pub relay: RelayId,
    pub enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Auxiliary circuits switched by relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayId {
    Claw,
    Lights,
    Electromagnet,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RelayId {
    /// Every relay on the vehicle.
    pub const ALL: [RelayId; 3] = [RelayId::Claw, RelayId::Lights, RelayId::Electromagnet];

    /// The id used on the wire.
    pub fn wire_id(&self) -> u8 {
        match self {
            RelayId::Claw => 0,
            RelayId::Lights => 1,
            RelayId::Electromagnet => 2,
        }
    }

    /// Get the relay from its wire id.
    pub fn from_wire_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.wire_id() == id)
    }
}

impl RelayCmd {
    /// Length of the payload in bytes.
    pub const PAYLOAD_LEN: usize = 2;

    /// Encode the command as sent to the relay server.
    pub fn to_bytes(&self) -> [u8; Self::PAYLOAD_LEN] {
        [self.relay.wire_id(), self.enabled as u8]
    }

    /// Decode a payload, `None` if the relay id is unknown or the state isn't 0 or 1.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [id, state] if *state <= 1 => RelayId::from_wire_id(*id).map(|relay| Self {
                relay,
                enabled: *state == 1,
            }),
            _ => None,
        }
    }
}
