//! # MAVLink vehicle IO
//!
//! [`MavlinkIo`] implements [`VehicleIo`] over a MAVLink connection to an ArduSub autopilot.
//!
//! The connection's `recv` blocks, so a reader thread owns the receive side and forwards
//! heartbeats and altitude telemetry into channels which the control thread drains without
//! waiting.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, trace, warn};
use mavlink::{
    ardupilotmega::{
        MavAutopilot, MavCmd, MavMessage, MavModeFlag, MavType, COMMAND_LONG_DATA,
        HEARTBEAT_DATA, RC_CHANNELS_OVERRIDE_DATA,
    },
    error::MessageReadError,
    MavConnection, MavHeader, MavlinkVersion,
};

use super::{LinkIoError, VehicleIo};
use comms_if::vehicle::{Heartbeat, ModeMapping, RcOverride, Telemetry};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// System id this executable sends as, the conventional ground station id.
const GCS_SYSTEM_ID: u8 = 255;

/// Target used until the first heartbeat tells us who the autopilot is.
const DEFAULT_TARGET: (u8, u8) = (1, 1);

/// Pause after a receive IO error before trying again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

type Connection = Arc<Box<dyn MavConnection<MavMessage> + Sync + Send>>;

pub struct MavlinkIo {
    conn: Connection,

    heartbeat_rx: Receiver<(MavHeader, HEARTBEAT_DATA)>,
    telemetry_rx: Receiver<Telemetry>,

    /// System and component id of the autopilot, locked by the first autopilot heartbeat
    target: Option<(u8, u8)>,

    sequence: u8,

    modes: ModeMapping,

    _reader: JoinHandle<()>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MavlinkIo {
    /// Open a connection to the vehicle.
    ///
    /// `endpoint` is a MAVLink connection string, for instance `udpin:0.0.0.0:14550`.
    pub fn connect(endpoint: &str) -> Result<Self, LinkIoError> {
        let mut conn = mavlink::connect::<MavMessage>(endpoint)
            .map_err(|e| LinkIoError::ConnectError(endpoint.to_string(), e))?;
        conn.set_protocol_version(MavlinkVersion::V2);

        let conn: Connection = Arc::new(conn);

        let (heartbeat_tx, heartbeat_rx) = mpsc::channel();
        let (telemetry_tx, telemetry_rx) = mpsc::channel();

        let reader_conn = conn.clone();
        let reader = thread::spawn(move || reader_thread(reader_conn, heartbeat_tx, telemetry_tx));

        info!("MAVLink connection opened on \"{}\"", endpoint);

        Ok(Self {
            conn,
            heartbeat_rx,
            telemetry_rx,
            target: None,
            sequence: 0,
            modes: ModeMapping::ardusub(),
            _reader: reader,
        })
    }

    fn send(&mut self, what: &'static str, msg: MavMessage) -> Result<(), LinkIoError> {
        let header = MavHeader {
            system_id: GCS_SYSTEM_ID,
            component_id: 0,
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);

        self.conn
            .send(&header, &msg)
            .map(|_| ())
            .map_err(|e| LinkIoError::SendError(what, e.to_string()))
    }

    fn target(&self) -> (u8, u8) {
        self.target.unwrap_or(DEFAULT_TARGET)
    }

    fn command_long(&self, command: MavCmd, param1: f32, param2: f32) -> MavMessage {
        MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            param1,
            param2,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
            command,
            target_system: self.target().0,
            target_component: self.target().1,
            confirmation: 0,
        })
    }
}

impl VehicleIo for MavlinkIo {
    fn try_recv_heartbeat(&mut self) -> Option<Heartbeat> {
        loop {
            let (header, hb) = self.heartbeat_rx.try_recv().ok()?;

            if !is_vehicle_heartbeat(self.target, &header, &hb) {
                trace!(
                    "Ignored heartbeat from system {} component {}",
                    header.system_id,
                    header.component_id
                );
                continue;
            }

            if self.target.is_none() {
                info!(
                    "Targeting autopilot at system {} component {}",
                    header.system_id, header.component_id
                );
                self.target = Some((header.system_id, header.component_id));
            }

            return Some(Heartbeat {
                base_mode: hb.base_mode.bits(),
                custom_mode: hb.custom_mode,
            });
        }
    }

    fn try_recv_telemetry(&mut self) -> Option<Telemetry> {
        self.telemetry_rx.try_recv().ok()
    }

    fn send_rc_override(&mut self, cmd: &RcOverride) -> Result<(), LinkIoError> {
        let c = &cmd.channels;
        let msg = MavMessage::RC_CHANNELS_OVERRIDE(RC_CHANNELS_OVERRIDE_DATA {
            chan1_raw: c[0],
            chan2_raw: c[1],
            chan3_raw: c[2],
            chan4_raw: c[3],
            chan5_raw: c[4],
            chan6_raw: c[5],
            chan7_raw: c[6],
            chan8_raw: c[7],
            target_system: self.target().0,
            target_component: self.target().1,
            chan9_raw: c[8],
            chan10_raw: c[9],
            chan11_raw: c[10],
            chan12_raw: c[11],
            chan13_raw: c[12],
            chan14_raw: c[13],
            chan15_raw: c[14],
            chan16_raw: c[15],
            chan17_raw: c[16],
            chan18_raw: c[17],
        });

        self.send("RC override", msg)
    }

    fn send_arm(&mut self, arm: bool) -> Result<(), LinkIoError> {
        let param1 = if arm { 1.0 } else { 0.0 };
        let msg = self.command_long(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, param1, 0.0);
        self.send("arm command", msg)
    }

    fn send_mode(&mut self, mode_id: u32) -> Result<(), LinkIoError> {
        let msg = self.command_long(
            MavCmd::MAV_CMD_DO_SET_MODE,
            MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32,
            mode_id as f32,
        );
        self.send("mode command", msg)
    }

    fn mode_mapping(&self) -> &ModeMapping {
        &self.modes
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Whether a heartbeat comes from the vehicle's autopilot.
///
/// Ground stations, companion computers, cameras and gimbals also send heartbeats, with an
/// invalid autopilot field. Once `target` is locked only that system and component is accepted.
pub(crate) fn is_vehicle_heartbeat(
    target: Option<(u8, u8)>,
    header: &MavHeader,
    hb: &HEARTBEAT_DATA,
) -> bool {
    if hb.mavtype == MavType::MAV_TYPE_GCS || hb.autopilot == MavAutopilot::MAV_AUTOPILOT_INVALID {
        return false;
    }

    match target {
        Some(t) => t == (header.system_id, header.component_id),
        None => true,
    }
}

/// Receive messages until the control side is dropped.
fn reader_thread(
    conn: Connection,
    heartbeat_tx: Sender<(MavHeader, HEARTBEAT_DATA)>,
    telemetry_tx: Sender<Telemetry>,
) {
    loop {
        let sent = match conn.recv() {
            Ok((header, MavMessage::HEARTBEAT(hb))) => heartbeat_tx.send((header, hb)).is_ok(),
            Ok((_, MavMessage::VFR_HUD(hud))) => telemetry_tx
                .send(Telemetry { altitude_m: hud.alt })
                .is_ok(),
            Ok(_) => true,
            Err(MessageReadError::Io(e)) => {
                if e.kind() != std::io::ErrorKind::WouldBlock {
                    warn!("MAVLink receive error: {}", e);
                    thread::sleep(RECV_ERROR_BACKOFF);
                }
                true
            }
            Err(e) => {
                trace!("Dropped unparsable MAVLink message: {}", e);
                true
            }
        };

        if !sent {
            debug!("Vehicle link closed, stopping MAVLink reader");
            break;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use mavlink::ardupilotmega::MavState;

    fn header(system_id: u8, component_id: u8) -> MavHeader {
        MavHeader {
            system_id,
            component_id,
            sequence: 0,
        }
    }

    fn heartbeat(mavtype: MavType, autopilot: MavAutopilot, base_mode: u8) -> HEARTBEAT_DATA {
        HEARTBEAT_DATA {
            custom_mode: 0,
            mavtype,
            autopilot,
            base_mode: MavModeFlag::from_bits_truncate(base_mode),
            system_status: MavState::MAV_STATE_ACTIVE,
            mavlink_version: 3,
        }
    }

    fn autopilot(base_mode: u8) -> HEARTBEAT_DATA {
        heartbeat(
            MavType::MAV_TYPE_SUBMARINE,
            MavAutopilot::MAV_AUTOPILOT_ARDUPILOTMEGA,
            base_mode,
        )
    }

    #[test]
    fn test_autopilot_heartbeat_accepted() {
        assert!(is_vehicle_heartbeat(None, &header(1, 1), &autopilot(0x81)));
        assert!(is_vehicle_heartbeat(Some((1, 1)), &header(1, 1), &autopilot(0x81)));
    }

    #[test]
    fn test_non_autopilot_heartbeats_ignored() {
        let companion = heartbeat(
            MavType::MAV_TYPE_ONBOARD_CONTROLLER,
            MavAutopilot::MAV_AUTOPILOT_INVALID,
            0x00,
        );
        let camera = heartbeat(MavType::MAV_TYPE_CAMERA, MavAutopilot::MAV_AUTOPILOT_INVALID, 0x00);
        let gcs = heartbeat(MavType::MAV_TYPE_GCS, MavAutopilot::MAV_AUTOPILOT_INVALID, 0x00);

        for &target in &[None, Some((1, 1))] {
            assert!(!is_vehicle_heartbeat(target, &header(1, 191), &companion));
            assert!(!is_vehicle_heartbeat(target, &header(1, 100), &camera));
            assert!(!is_vehicle_heartbeat(target, &header(255, 190), &gcs));
        }
    }

    #[test]
    fn test_other_autopilot_ignored_once_locked() {
        assert!(!is_vehicle_heartbeat(Some((1, 1)), &header(2, 1), &autopilot(0x00)));
        assert!(!is_vehicle_heartbeat(Some((1, 1)), &header(1, 2), &autopilot(0x00)));
    }
}
