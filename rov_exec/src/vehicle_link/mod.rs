//! # Vehicle link
//!
//! [`VehicleLink`] tracks the connection, arm and mode state of the vehicle from its heartbeats,
//! and is the single place commands to the vehicle go through:
//!
//! - Thruster commands via the [`ActuatorInterface`] impl, validated and then dropped (not
//!   queued) while the vehicle is disconnected or disarmed.
//! - Arm, disarm and mode commands over the vehicle link.
//! - Relay and camera commands over the side channels, through the [`CommandDispatcher`].
//!
//! State is only changed by [`VehicleLink::poll`] and the setters, all called from the control
//! thread. Events are only published on a change of state.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod events;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::{
    eqpt::{
        cam::{CamId, CamStateMap},
        relay::{RelayCmd, RelayId},
    },
    vehicle::RcOverride,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    actuator::{self, ActuatorError, ActuatorInterface, NormalizedInputs, RawChannelValues},
    clock::Clock,
    dispatcher::{CommandDispatcher, SideChannelCmd},
    link::VehicleIo,
};
pub use events::{EventBus, EventHandler, LinkEvent, LinkEventKind};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleLinkParams {
    /// Time without a heartbeat after which the vehicle is considered disconnected.
    ///
    /// Units: seconds
    pub heartbeat_timeout_s: f64,

    /// Cameras enabled at start up, all others are disabled
    pub enabled_cameras: Vec<CamId>,
}

/// Flight mode reported by the vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub id: u32,

    /// Name of the mode, `None` if the id isn't in the mode table
    pub name: Option<String>,
}

pub struct VehicleLink {
    io: Box<dyn VehicleIo>,
    dispatcher: Box<dyn CommandDispatcher>,
    clock: Arc<dyn Clock>,

    heartbeat_timeout_s: f64,

    connection: ConnectionState,
    arm: ArmState,
    mode: Option<Mode>,
    cameras: CamStateMap,

    /// Time the last heartbeat was received
    last_heartbeat_s: Option<f64>,

    depth_m: Option<f32>,

    bus: EventBus,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Disarmed,
    Armed,
}

#[derive(Debug, Error)]
pub enum VehicleLinkError {
    #[error("Unrecognised mode \"{0}\", accepted modes are {1:?}")]
    UnrecognisedMode(String, Vec<String>),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for VehicleLinkParams {
    fn default() -> Self {
        Self {
            heartbeat_timeout_s: 2.0,
            enabled_cameras: vec![CamId::Front, CamId::Bottom],
        }
    }
}

impl VehicleLink {
    pub fn new(
        io: Box<dyn VehicleIo>,
        dispatcher: Box<dyn CommandDispatcher>,
        clock: Arc<dyn Clock>,
        params: &VehicleLinkParams,
    ) -> Self {
        let cameras = CamId::ALL
            .iter()
            .map(|c| (*c, params.enabled_cameras.contains(c)))
            .collect();

        Self {
            io,
            dispatcher,
            clock,
            heartbeat_timeout_s: params.heartbeat_timeout_s,
            connection: ConnectionState::Disconnected,
            arm: ArmState::Disarmed,
            mode: None,
            cameras,
            last_heartbeat_s: None,
            depth_m: None,
            bus: EventBus::default(),
        }
    }

    /// Register a handler for one kind of event.
    pub fn subscribe(&mut self, kind: LinkEventKind, handler: EventHandler) {
        self.bus.subscribe(kind, handler);
    }

    /// Update the link state from any pending messages, without blocking.
    ///
    /// Returns the events fired by this poll, which have also been published to subscribers.
    pub fn poll(&mut self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        let now_s = self.clock.now_s();

        match self.io.try_recv_heartbeat() {
            Some(hb) => {
                self.last_heartbeat_s = Some(now_s);

                if self.connection == ConnectionState::Disconnected {
                    info!("Vehicle connected");
                    self.connection = ConnectionState::Connected;
                    events.push(LinkEvent::Connected);
                }

                let arm = match hb.is_armed() {
                    true => ArmState::Armed,
                    false => ArmState::Disarmed,
                };

                if arm != self.arm {
                    self.arm = arm;
                    match arm {
                        ArmState::Armed => {
                            info!("Vehicle armed");
                            debug!(
                                "Accepted modes: {:?}",
                                self.io.mode_mapping().names().collect::<Vec<_>>()
                            );
                            events.push(LinkEvent::Armed);
                        }
                        ArmState::Disarmed => {
                            info!("Vehicle disarmed");
                            events.push(LinkEvent::Disarmed);
                        }
                    }
                }

                if self.mode.as_ref().map(|m| m.id) != Some(hb.custom_mode) {
                    let name = self
                        .io
                        .mode_mapping()
                        .name_of(hb.custom_mode)
                        .map(String::from);

                    info!("New mode: {} ({})", name.as_deref().unwrap_or("UNKNOWN"), hb.custom_mode);

                    self.mode = Some(Mode {
                        id: hb.custom_mode,
                        name: name.clone(),
                    });
                    events.push(LinkEvent::ModeChanged {
                        mode_id: hb.custom_mode,
                        name,
                    });
                }
            }
            None => {
                if let (ConnectionState::Connected, Some(last)) =
                    (self.connection, self.last_heartbeat_s)
                {
                    if now_s - last >= self.heartbeat_timeout_s {
                        warn!(
                            "No heartbeat for {:.02} s, vehicle disconnected",
                            now_s - last
                        );
                        self.connection = ConnectionState::Disconnected;
                        events.push(LinkEvent::Disconnected);
                    }
                }
            }
        }

        if let Some(tm) = self.io.try_recv_telemetry() {
            self.depth_m = Some(tm.altitude_m);
            events.push(LinkEvent::Depth(tm.altitude_m));
        }

        for event in events.iter() {
            self.bus.publish(event);
        }

        events
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn is_armed(&self) -> bool {
        self.arm == ArmState::Armed
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm
    }

    /// The last mode reported by the vehicle.
    pub fn mode(&self) -> Option<&Mode> {
        self.mode.as_ref()
    }

    pub fn camera_states(&self) -> &CamStateMap {
        &self.cameras
    }

    /// The last altitude reported by the vehicle, in meters.
    pub fn depth_m(&self) -> Option<f32> {
        self.depth_m
    }

    /// Request the vehicle arms.
    pub fn arm(&mut self) {
        match self.io.send_arm(true) {
            Ok(()) => info!("Arm command sent"),
            Err(e) => error!("{}", e),
        }
    }

    /// Turn off every relay, then request the vehicle disarms.
    pub fn disarm(&mut self) {
        self.turn_off_relays();

        match self.io.send_arm(false) {
            Ok(()) => info!("Disarm command sent"),
            Err(e) => error!("{}", e),
        }
    }

    /// Request the vehicle switches to the named mode.
    ///
    /// Unknown names are logged and otherwise ignored.
    pub fn set_mode(&mut self, name: &str) {
        info!("Setting mode: {}", name);

        if let Err(e) = self.try_set_mode(name) {
            warn!("{}", e);
        }
    }

    fn try_set_mode(&mut self, name: &str) -> Result<(), VehicleLinkError> {
        let modes = self.io.mode_mapping();

        let mode_id = modes.id_of(name).ok_or_else(|| {
            VehicleLinkError::UnrecognisedMode(
                name.to_string(),
                modes.names().map(String::from).collect(),
            )
        })?;

        if let Err(e) = self.io.send_mode(mode_id) {
            error!("{}", e);
        }

        Ok(())
    }

    /// Set a relay.
    ///
    /// Ignored while disconnected, and enabling is ignored while disarmed. Disabling a relay is
    /// allowed while disarmed.
    pub fn set_relay(&mut self, relay: RelayId, enabled: bool) {
        if !self.is_connected() || (!self.is_armed() && enabled) {
            debug!("Relay {:?} -> {} ignored", relay, enabled);
            return;
        }

        debug!("Setting relay {:?} to {}", relay, enabled);
        self.dispatcher
            .dispatch(SideChannelCmd::Relay(RelayCmd { relay, enabled }));
    }

    pub fn turn_off_relays(&mut self) {
        for &relay in RelayId::ALL.iter() {
            self.set_relay(relay, false);
        }
    }

    /// Enable or disable a camera, then send the state of every camera.
    ///
    /// Ignored while disconnected.
    pub fn set_camera_enabled(&mut self, cam: CamId, enabled: bool) {
        if !self.is_connected() {
            debug!("Camera {:?} -> {} ignored", cam, enabled);
            return;
        }

        self.cameras.insert(cam, enabled);
        self.bus.publish(&LinkEvent::CamerasSet(self.cameras.clone()));

        self.send_camera_state();
    }

    /// Send the state of every camera to the camera server.
    pub fn send_camera_state(&mut self) {
        debug!("Setting enabled cameras to {:?}", self.cameras);
        self.dispatcher
            .dispatch(SideChannelCmd::Cameras(self.cameras.clone()));
    }

    fn send_rc_override(&mut self, cmd: &RcOverride) {
        if let Err(e) = self.io.send_rc_override(cmd) {
            error!("{}", e);
        }
    }
}

impl ActuatorInterface for VehicleLink {
    fn set_normalized_inputs(&mut self, inputs: &NormalizedInputs) -> Result<(), ActuatorError> {
        let cmd = actuator::normalized_to_rc_override(inputs)?;

        if self.is_connected() && self.is_armed() {
            self.send_rc_override(&cmd);
        }

        Ok(())
    }

    fn set_raw_channel_values(&mut self, pwms: &RawChannelValues) -> Result<(), ActuatorError> {
        let cmd = actuator::raw_to_rc_override(pwms)?;

        if self.is_connected() && self.is_armed() {
            self.send_rc_override(&cmd);
        }

        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), ActuatorError> {
        self.set_normalized_inputs(&actuator::zero_inputs())?;
        debug!("Thrusters stopped");
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
