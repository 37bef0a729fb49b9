//! # Actuator interface
//!
//! Converts control intents into RC override commands. Two kinds of intent are accepted:
//!
//! - Normalised inputs, one value in `[-1, 1]` per logical [`InputChannel`], mapped to a PWM by
//!   `round(value * 400 + 1500)`.
//! - Raw PWMs addressed by physical channel id.
//!
//! Every value of a command is validated before anything is built, so a single bad axis rejects
//! the whole command and nothing is sent. Channels without a value are sent as the ignore
//! sentinel, leaving them unaffected on the vehicle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use comms_if::vehicle::{
    InputChannel, RcOverride, CHANNEL_ID_MAX, CHANNEL_ID_MIN, PWM_MAX, PWM_MIN, PWM_NEUTRAL,
    PWM_SCALE,
};
use log::error;
use thiserror::Error;
use util::maths::in_range;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Normalised control intent, each value in `[-1, 1]`.
pub type NormalizedInputs = BTreeMap<InputChannel, f64>;

/// Raw PWM command addressed by physical channel id.
pub type RawChannelValues = BTreeMap<i32, i32>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Commanding the vehicle's thrusters.
pub trait ActuatorInterface {
    /// Command the vehicle with normalised inputs.
    ///
    /// Fails with [`ActuatorError::OutOfRange`] if any value is outside `[-1, 1]`, in which case
    /// nothing is sent.
    fn set_normalized_inputs(&mut self, inputs: &NormalizedInputs) -> Result<(), ActuatorError>;

    /// Command the vehicle with raw PWMs.
    ///
    /// Fails if any channel id or PWM is out of range, in which case nothing is sent.
    fn set_raw_channel_values(&mut self, pwms: &RawChannelValues) -> Result<(), ActuatorError>;

    /// Command zero on every logical axis.
    fn stop_all(&mut self) -> Result<(), ActuatorError> {
        self.set_normalized_inputs(&zero_inputs())
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("{name} value {value} is outside the valid range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "Channel {0} does not exist, expected an id in [{min}, {max}]",
        min = CHANNEL_ID_MIN,
        max = CHANNEL_ID_MAX
    )]
    InvalidChannel(i32),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Zero intent on every logical axis.
pub fn zero_inputs() -> NormalizedInputs {
    InputChannel::ALL.iter().map(|&c| (c, 0.0)).collect()
}

/// Build the RC override for a set of normalised inputs.
pub fn normalized_to_rc_override(inputs: &NormalizedInputs) -> Result<RcOverride, ActuatorError> {
    for (channel, &value) in inputs {
        if !in_range(value, -1.0, 1.0) {
            return Err(ActuatorError::OutOfRange {
                name: format!("{} input", channel),
                value,
                min: -1.0,
                max: 1.0,
            });
        }
    }

    let mut cmd = RcOverride::ignore_all();

    for (channel, &value) in inputs {
        cmd.set(channel.channel_id(), normalized_to_pwm(value));
    }

    Ok(cmd)
}

/// Build the RC override for a set of raw PWMs.
pub fn raw_to_rc_override(pwms: &RawChannelValues) -> Result<RcOverride, ActuatorError> {
    for (&channel_id, &pwm) in pwms {
        if !in_range(channel_id, CHANNEL_ID_MIN, CHANNEL_ID_MAX) {
            return Err(ActuatorError::InvalidChannel(channel_id));
        }

        if !in_range(pwm, PWM_MIN, PWM_MAX) {
            return Err(ActuatorError::OutOfRange {
                name: format!("Channel {} PWM", channel_id),
                value: pwm as f64,
                min: PWM_MIN as f64,
                max: PWM_MAX as f64,
            });
        }
    }

    let mut cmd = RcOverride::ignore_all();

    for (&channel_id, &pwm) in pwms {
        cmd.set(channel_id, pwm as u16);
    }

    Ok(cmd)
}

/// Map an already validated normalised value to a PWM.
///
/// The result is clamped into the PWM range. A value in `[-1, 1]` never needs the clamp, if it
/// does the validation upstream is broken.
fn normalized_to_pwm(value: f64) -> u16 {
    let pwm = (value * PWM_SCALE + PWM_NEUTRAL).round();
    let clamped = pwm.max(PWM_MIN as f64).min(PWM_MAX as f64);

    if clamped != pwm {
        error!(
            "Normalised input {} mapped to PWM {} outside [{}, {}], clamped to {}",
            value, pwm, PWM_MIN, PWM_MAX, clamped
        );
        debug_assert!(false, "PWM clamp triggered for a validated input");
    }

    clamped as u16
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
