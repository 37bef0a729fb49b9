//! # Tasks
//!
//! Autonomous behaviours implement the [`Task`] lifecycle and are driven by the [`TaskRunner`]:
//!
//! 1. `initialize` once, before anything else.
//! 2. `periodic` every tick, after which `is_finished` is checked.
//! 3. `end` exactly once, when the task finishes, fails, or is aborted.
//!
//! `end` is the only cleanup hook a task gets, and must leave the vehicle stopped in a known mode
//! whatever state the task was in, including after a failed `initialize`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod button_docking;
mod runner;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::{eqpt::per::TargetObservation, tc::TaskKind};
use thiserror::Error;

use crate::{actuator::ActuatorError, clock::Clock, vehicle_link::VehicleLink};
pub use button_docking::{ButtonDocking, ButtonDockingParams};
pub use runner::{TaskRunner, TaskStatus};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Task: Send {
    /// Name of the task for logging.
    fn name(&self) -> &'static str;

    fn initialize(&mut self, vehicle: &mut VehicleLink) -> Result<(), TaskError>;

    fn periodic(&mut self, vehicle: &mut VehicleLink) -> Result<(), TaskError>;

    fn is_finished(&self) -> bool;

    fn end(&mut self, vehicle: &mut VehicleLink);

    /// Called with each new observation from the perception routine, before `periodic`.
    fn handle_observation(&mut self, _obs: &TargetObservation) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Builds tasks from their [`TaskKind`].
pub struct TaskFactory {
    clock: Arc<dyn Clock>,
    button_docking: ButtonDockingParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Actuator command rejected: {0}")]
    ActuatorError(#[from] ActuatorError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TaskFactory {
    pub fn new(clock: Arc<dyn Clock>, button_docking: ButtonDockingParams) -> Self {
        Self {
            clock,
            button_docking,
        }
    }

    pub fn create(&self, kind: TaskKind) -> Box<dyn Task> {
        match kind {
            TaskKind::ButtonDocking => Box::new(ButtonDocking::new(
                self.button_docking.clone(),
                self.clock.clone(),
            )),
        }
    }
}
