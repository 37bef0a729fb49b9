//! # Button docking parameters

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonDockingParams {
    /// Forward input while crawling towards the target
    pub crawl_speed: f64,

    /// Forward input while steering, before scaling
    pub forward_speed: f64,

    /// Forward input while ramming
    pub ram_speed: f64,

    /// Throttle input while ramming, a small negative bias to keep the nose down
    pub ram_throttle: f64,

    /// Gain of the throttle response to vertical offset
    pub translation_sensitivity: f64,

    /// Gain of the pitch and yaw response to offset
    pub rotational_sensitivity: f64,

    /// Fraction of the frame the target must cover to start steering
    pub start_fraction: f64,

    /// Fraction of the frame the target must cover to stop steering and ram
    pub stop_fraction: f64,

    /// Fraction of the frame the target must exceed to end the task
    pub end_fraction: f64,

    /// Height, as a fraction of the frame from the top, steering aims the target at
    pub aim_height_fraction: f64,

    /// The task can't end before this time has passed.
    ///
    /// Units: seconds
    pub min_task_duration_s: f64,

    /// The task ends once this time has passed, whether the target was reached or not.
    ///
    /// Units: seconds
    pub max_task_duration_s: f64,

    /// Mode held while crawling
    pub crawl_mode: String,

    /// Mode entered when steering starts
    pub steer_mode: String,

    /// Mode the vehicle is left in when the task ends
    pub end_mode: String,
}

impl Default for ButtonDockingParams {
    fn default() -> Self {
        Self {
            crawl_speed: 0.4,
            forward_speed: 0.9,
            ram_speed: 0.9,
            ram_throttle: -0.08,
            translation_sensitivity: 0.45,
            rotational_sensitivity: 0.55,
            start_fraction: 0.035,
            stop_fraction: 0.15,
            end_fraction: 0.3,
            aim_height_fraction: 0.4,
            min_task_duration_s: 2.0,
            max_task_duration_s: 500.0,
            crawl_mode: "ALT_HOLD".into(),
            steer_mode: "MANUAL".into(),
            end_mode: "MANUAL".into(),
        }
    }
}
