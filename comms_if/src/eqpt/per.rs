//! # Perception Interface
//!
//! The perception process finds the target in each camera frame and reports where it is. The
//! control core consumes only these observations, never the images themselves.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Position reported when no target was found in the frame.
pub const NO_TARGET_POSITION: (f64, f64) = (-1.0, -1.0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Where the target is in a single frame.
///
/// All values are in pixels with the origin at the top left of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetObservation {
    /// Centre of the target's bounding box
    pub position: (f64, f64),

    /// Width and height of the target's bounding box
    pub size: (f64, f64),

    /// Width and height of the frame the target was found in
    pub frame_size: (f64, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TargetObservation {
    /// Build an observation from the top left corner and size of a bounding box.
    pub fn from_bounding_box(
        x: f64, 
        y: f64, 
        width: f64, 
        height: f64, 
        frame_size: (f64, f64)
    ) -> Self {
        Self {
            position: (x + width / 2.0, y + height / 2.0),
            size: (width, height),
            frame_size,
        }
    }

    /// An observation of a frame in which no target was found.
    pub fn no_target(frame_size: (f64, f64)) -> Self {
        Self {
            position: NO_TARGET_POSITION,
            size: (0.0, 0.0),
            frame_size,
        }
    }

    /// Returns true if this observation contains a target.
    ///
    /// A target with a zero sized bounding box is still a target.
    pub fn has_target(&self) -> bool {
        self.position != NO_TARGET_POSITION 
            && self.frame_size.0 > 0.0 
            && self.frame_size.1 > 0.0
    }

    /// Fraction of the frame's width and height covered by the target.
    pub fn size_fraction(&self) -> (f64, f64) {
        (self.size.0 / self.frame_size.0, self.size.1 / self.frame_size.1)
    }
}
