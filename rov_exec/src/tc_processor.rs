//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use comms_if::tc::Tc;
use crate::{
    actuator::ActuatorInterface,
    perception::ObservationSender,
    task::{TaskFactory, TaskRunner},
    vehicle_link::VehicleLink,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Everything a TC can act on.
pub struct TcTarget<'a> {
    pub vehicle: &'a mut VehicleLink,
    pub runner: &'a mut TaskRunner,
    pub factory: &'a TaskFactory,
    pub observations: &'a ObservationSender,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub fn exec(target: &mut TcTarget, tc: &Tc) {

    debug!("Executing {:?}", tc);

    match tc {
        Tc::Arm => target.vehicle.arm(),
        Tc::Disarm => {
            // Nothing may drive the thrusters once disarmed
            target.runner.abort(target.vehicle);
            target.vehicle.disarm();
        },
        Tc::SetMode(mode) => target.vehicle.set_mode(mode),
        Tc::SetRelay { relay, enabled } => target.vehicle.set_relay(*relay, *enabled),
        Tc::SetCamera { camera, enabled } => {
            target.vehicle.set_camera_enabled(*camera, *enabled)
        },
        Tc::SetInputs(inputs) => {
            if let Err(e) = target.vehicle.set_normalized_inputs(inputs) {
                warn!("Inputs rejected: {}", e);
            }
        },
        Tc::StopThrusters => {
            if let Err(e) = target.vehicle.stop_all() {
                warn!("Could not stop thrusters: {}", e);
            }
        },
        Tc::StartTask(kind) => {
            info!("Task {:?} requested", kind);
            let task = target.factory.create(*kind);
            target.runner.start(task, target.vehicle);
        },
        Tc::AbortTask => {
            if target.runner.is_running() {
                target.runner.abort(target.vehicle);
            }
            else {
                warn!("AbortTask received but no task is running");
            }
        },
        Tc::Observation(obs) => target.observations.send(*obs),
    }

}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
