//! # Camera Equipment Communications Module
//!
//! The camera server on the vehicle streams only those cameras which are enabled. The enabled
//! set is always sent in full as a single line of JSON, never as a change.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Enabled flag of every camera on the vehicle.
pub type CamStateMap = BTreeMap<CamId, bool>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Cameras available on the vehicle
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CamId {
    /// Forward looking camera
    Front,

    /// Downward looking camera
    Bottom,

    /// Rear looking camera
    Back,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamId {
    pub const ALL: [CamId; 3] = [CamId::Front, CamId::Bottom, CamId::Back];
}

/// State map used at start up: front and bottom cameras on, everything else off.
pub fn default_cam_states() -> CamStateMap {
    CamId::ALL
        .iter()
        .map(|&c| (c, matches!(c, CamId::Front | CamId::Bottom)))
        .collect()
}

/// Encode the camera map as the newline terminated JSON line sent to the camera server.
pub fn to_line(states: &CamStateMap) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(states)?;
    line.push('\n');
    Ok(line)
}

/// Decode a line received by a camera server.
pub fn from_line(line: &str) -> Result<CamStateMap, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cam_line() {
        let states = default_cam_states();
        let line = to_line(&states).unwrap();

        assert_eq!(line, "{\"front\":true,\"bottom\":true,\"back\":false}\n");
        assert_eq!(from_line(&line).unwrap(), states);
    }
}
