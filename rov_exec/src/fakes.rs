//! Fakes of the vehicle and side channels for unit tests.
//!
//! The fake vehicle IO and the recording dispatcher write to the same journal, so tests can
//! check the order of commands across both.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use comms_if::vehicle::{
    Heartbeat, ModeMapping, RcOverride, Telemetry, BASE_MODE_ARMED_FLAG,
};

use crate::{
    clock::ManualClock,
    dispatcher::{CommandDispatcher, SideChannelCmd},
    link::{LinkIoError, VehicleIo},
    vehicle_link::{VehicleLink, VehicleLinkParams},
};

/// A command that left the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    RcOverride(RcOverride),
    Arm(bool),
    Mode(u32),
    Side(SideChannelCmd),
}

type Journal = Arc<Mutex<Vec<Sent>>>;

/// Test side handle on the fake vehicle.
#[derive(Clone, Default)]
pub struct FakeVehicle {
    journal: Journal,
    heartbeats: Arc<Mutex<VecDeque<Heartbeat>>>,
    telemetry: Arc<Mutex<VecDeque<Telemetry>>>,
}

struct FakeVehicleIo {
    vehicle: FakeVehicle,
    modes: ModeMapping,
}

struct RecordingDispatcher {
    journal: Journal,
}

impl FakeVehicle {
    /// A link to a fresh fake vehicle, with a manual clock at zero.
    pub fn link() -> (VehicleLink, FakeVehicle, ManualClock) {
        let vehicle = FakeVehicle::default();
        let clock = ManualClock::new(0.0);

        let link = VehicleLink::new(
            Box::new(FakeVehicleIo {
                vehicle: vehicle.clone(),
                modes: ModeMapping::ardusub(),
            }),
            Box::new(RecordingDispatcher {
                journal: vehicle.journal.clone(),
            }),
            Arc::new(clock.clone()),
            &VehicleLinkParams::default(),
        );

        (link, vehicle, clock)
    }

    /// A link which has seen an armed heartbeat in MANUAL, with an empty journal.
    pub fn armed_link() -> (VehicleLink, FakeVehicle, ManualClock) {
        let (mut link, vehicle, clock) = Self::link();
        vehicle.push_heartbeat(true, 19);
        link.poll();
        vehicle.clear();
        (link, vehicle, clock)
    }

    pub fn push_heartbeat(&self, armed: bool, custom_mode: u32) {
        let base_mode = if armed { BASE_MODE_ARMED_FLAG } else { 0 };
        self.push_raw_heartbeat(base_mode, custom_mode);
    }

    pub fn push_raw_heartbeat(&self, base_mode: u8, custom_mode: u32) {
        self.heartbeats.lock().unwrap().push_back(Heartbeat {
            base_mode,
            custom_mode,
        });
    }

    pub fn push_telemetry(&self, altitude_m: f32) {
        self.telemetry
            .lock()
            .unwrap()
            .push_back(Telemetry { altitude_m });
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.journal.lock().unwrap().clone()
    }

    /// Only the RC overrides sent.
    pub fn rc_overrides(&self) -> Vec<RcOverride> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::RcOverride(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.journal.lock().unwrap().clear();
    }

    fn record(&self, sent: Sent) {
        self.journal.lock().unwrap().push(sent);
    }
}

impl VehicleIo for FakeVehicleIo {
    fn try_recv_heartbeat(&mut self) -> Option<Heartbeat> {
        self.vehicle.heartbeats.lock().unwrap().pop_front()
    }

    fn try_recv_telemetry(&mut self) -> Option<Telemetry> {
        self.vehicle.telemetry.lock().unwrap().pop_front()
    }

    fn send_rc_override(&mut self, cmd: &RcOverride) -> Result<(), LinkIoError> {
        self.vehicle.record(Sent::RcOverride(*cmd));
        Ok(())
    }

    fn send_arm(&mut self, arm: bool) -> Result<(), LinkIoError> {
        self.vehicle.record(Sent::Arm(arm));
        Ok(())
    }

    fn send_mode(&mut self, mode_id: u32) -> Result<(), LinkIoError> {
        self.vehicle.record(Sent::Mode(mode_id));
        Ok(())
    }

    fn mode_mapping(&self) -> &ModeMapping {
        &self.modes
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn dispatch(&self, cmd: SideChannelCmd) {
        self.journal.lock().unwrap().push(Sent::Side(cmd));
    }
}
