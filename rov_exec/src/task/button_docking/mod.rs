//! # Button docking task
//!
//! Drives the vehicle into a target (the button) seen by the forward camera. The task moves
//! through three phases and never goes back to an earlier one:
//!
//! - `Crawl` - creep forward holding altitude until the target covers the start fraction of the
//!   frame.
//! - `Steer` - visual servo towards the target, in manual mode, until it covers the stop
//!   fraction of the frame.
//! - `Ram` - drive straight forward into the target.
//!
//! The task finishes once it has run for the minimum duration and either the target exceeds the
//! end fraction of the frame or the maximum duration has passed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::{eqpt::per::TargetObservation, vehicle::InputChannel};
use log::{debug, info};
use util::maths::clamp;

use super::{Task, TaskError};
use crate::{
    actuator::{ActuatorInterface, NormalizedInputs},
    clock::Clock,
    vehicle_link::VehicleLink,
};
pub use params::ButtonDockingParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ButtonDocking {
    params: ButtonDockingParams,
    clock: Arc<dyn Clock>,

    phase: TaskPhase,

    /// Time `initialize` was called
    start_time_s: Option<f64>,

    /// Last observation which contained the target
    last_obs: Option<TargetObservation>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPhase {
    Crawl,
    Steer,
    Ram,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ButtonDocking {
    pub fn new(params: ButtonDockingParams, clock: Arc<dyn Clock>) -> Self {
        Self {
            params,
            clock,
            phase: TaskPhase::Crawl,
            start_time_s: None,
            last_obs: None,
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// The phase to move to this tick, if any.
    ///
    /// Only the phase immediately after the current one is considered, so at most one transition
    /// happens per tick.
    fn next_phase(&self) -> Option<TaskPhase> {
        let (w_frac, h_frac) = self.last_obs?.size_fraction();
        let covers = |f: f64| w_frac >= f || h_frac >= f;

        match self.phase {
            TaskPhase::Crawl if covers(self.params.start_fraction) => Some(TaskPhase::Steer),
            TaskPhase::Steer if covers(self.params.stop_fraction) => Some(TaskPhase::Ram),
            _ => None,
        }
    }

    fn enter(&mut self, phase: TaskPhase, vehicle: &mut VehicleLink) {
        info!("Button docking: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;

        if phase == TaskPhase::Steer {
            vehicle.set_mode(&self.params.steer_mode);
        }
    }

    /// Crawl forward from the first tick, even before any target has been seen.
    fn inputs(&self) -> NormalizedInputs {
        match (self.phase, self.last_obs) {
            (TaskPhase::Crawl, _) => intent(self.params.crawl_speed, 0.0, 0.0, 0.0),
            (TaskPhase::Steer, Some(ref obs)) => self.steer_inputs(obs),
            (TaskPhase::Steer, None) => intent(0.0, 0.0, 0.0, 0.0),
            (TaskPhase::Ram, _) => intent(self.params.ram_speed, self.params.ram_throttle, 0.0, 0.0),
        }
    }

    /// Visual servo towards the target.
    ///
    /// Response is scaled down as the target grows in the frame.
    fn steer_inputs(&self, obs: &TargetObservation) -> NormalizedInputs {
        let p = &self.params;
        let (x, y) = obs.position;
        let (fw, fh) = obs.frame_size;

        let horizontal = (x - fw / 2.0) / (fw / 2.0);
        // Image y axis points down
        let vertical = -(y - fh * p.aim_height_fraction) / (fh / 2.0);

        let scale = (-(obs.size.0.max(1.0) / fw).ln() / 10.0).max(0.1);

        debug!(
            "Steering: horizontal {:.03}, vertical {:.03}, scale {:.03}",
            horizontal, vertical, scale
        );

        intent(
            scale * p.forward_speed,
            vertical * scale * p.translation_sensitivity,
            vertical * scale * p.rotational_sensitivity,
            horizontal * scale * p.rotational_sensitivity,
        )
    }
}

impl Task for ButtonDocking {
    fn name(&self) -> &'static str {
        "button_docking"
    }

    fn initialize(&mut self, vehicle: &mut VehicleLink) -> Result<(), TaskError> {
        vehicle.stop_all()?;
        self.start_time_s = Some(self.clock.now_s());

        vehicle.set_mode(&self.params.crawl_mode);
        self.phase = TaskPhase::Crawl;

        info!("Button docking: {:?}", self.phase);

        Ok(())
    }

    fn periodic(&mut self, vehicle: &mut VehicleLink) -> Result<(), TaskError> {
        if let Some(next) = self.next_phase() {
            self.enter(next, vehicle);
        }

        vehicle.set_normalized_inputs(&self.inputs())?;

        Ok(())
    }

    fn is_finished(&self) -> bool {
        let start_s = match self.start_time_s {
            Some(s) => s,
            None => return false,
        };
        let now_s = self.clock.now_s();

        if now_s < start_s + self.params.min_task_duration_s {
            return false;
        }

        let target_reached = match self.last_obs {
            Some(obs) => {
                let (w_frac, h_frac) = obs.size_fraction();
                w_frac > self.params.end_fraction || h_frac > self.params.end_fraction
            }
            None => false,
        };

        target_reached || now_s >= start_s + self.params.max_task_duration_s
    }

    fn end(&mut self, vehicle: &mut VehicleLink) {
        vehicle.set_mode(&self.params.end_mode);

        // Zero inputs are always valid
        vehicle.stop_all().ok();
    }

    fn handle_observation(&mut self, obs: &TargetObservation) {
        if obs.has_target() {
            self.last_obs = Some(*obs);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a full intent, saturating each axis. Lateral and roll are always zero.
fn intent(forward: f64, throttle: f64, pitch: f64, yaw: f64) -> NormalizedInputs {
    let sat = |v: f64| clamp(&v, &-1.0, &1.0);

    vec![
        (InputChannel::Forward, sat(forward)),
        (InputChannel::Lateral, 0.0),
        (InputChannel::Throttle, sat(throttle)),
        (InputChannel::Pitch, sat(pitch)),
        (InputChannel::Yaw, sat(yaw)),
        (InputChannel::Roll, 0.0),
    ]
    .into_iter()
    .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        clock::ManualClock,
        fakes::{FakeVehicle, Sent},
    };
    use comms_if::vehicle::RcOverride;

    const FRAME: (f64, f64) = (640.0, 480.0);

    /// Target centred on the aim point, covering `frac` of the frame width and height.
    fn target(frac: f64) -> TargetObservation {
        let (w, h) = (FRAME.0 * frac, FRAME.1 * frac);
        TargetObservation {
            position: (FRAME.0 / 2.0, FRAME.1 * 0.4),
            size: (w, h),
            frame_size: FRAME,
        }
    }

    fn started() -> (ButtonDocking, VehicleLink, FakeVehicle, ManualClock) {
        let (mut link, vehicle, clock) = FakeVehicle::armed_link();
        clock.set(100.0);

        let mut task = ButtonDocking::new(ButtonDockingParams::default(), Arc::new(clock.clone()));
        task.initialize(&mut link).unwrap();
        vehicle.clear();

        (task, link, vehicle, clock)
    }

    fn pwm(cmd: &RcOverride, channel: InputChannel) -> u16 {
        cmd.get(channel.channel_id()).unwrap()
    }

    #[test]
    fn test_initialize() {
        let (mut link, vehicle, _) = FakeVehicle::armed_link();
        let mut task = ButtonDocking::new(
            ButtonDockingParams::default(),
            Arc::new(ManualClock::new(0.0)),
        );

        task.initialize(&mut link).unwrap();

        let sent = vehicle.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], Sent::RcOverride(_)));
        assert_eq!(sent[1], Sent::Mode(2));
        assert_eq!(task.phase(), TaskPhase::Crawl);
    }

    #[test]
    fn test_crawl_without_target() {
        let (mut task, mut link, vehicle, _) = started();

        task.periodic(&mut link).unwrap();

        let cmds = vehicle.rc_overrides();
        assert_eq!(cmds.len(), 1);
        assert_eq!(pwm(&cmds[0], InputChannel::Forward), 1660);
        assert_eq!(pwm(&cmds[0], InputChannel::Yaw), 1500);
        assert_eq!(pwm(&cmds[0], InputChannel::Lateral), 1500);

        // No-target frames don't count as observations
        task.handle_observation(&TargetObservation::no_target(FRAME));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Crawl);
    }

    #[test]
    fn test_phases_only_move_forward() {
        let (mut task, mut link, vehicle, _) = started();

        task.handle_observation(&target(0.02));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Crawl);

        task.handle_observation(&target(0.05));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Steer);

        // Manual mode set exactly once, on entering steer
        let modes: Vec<_> = vehicle
            .sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Mode(_)))
            .collect();
        assert_eq!(modes, vec![Sent::Mode(19)]);

        // Target shrinking again doesn't go back to crawl
        task.handle_observation(&target(0.01));
        for _ in 0..5 {
            task.periodic(&mut link).unwrap();
            assert_eq!(task.phase(), TaskPhase::Steer);
        }

        task.handle_observation(&target(0.16));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Ram);

        let ram = vehicle.rc_overrides().pop().unwrap();
        assert_eq!(pwm(&ram, InputChannel::Forward), 1860);
        assert_eq!(pwm(&ram, InputChannel::Throttle), 1468);
        assert_eq!(pwm(&ram, InputChannel::Yaw), 1500);

        task.handle_observation(&target(0.01));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Ram);
    }

    #[test]
    fn test_one_transition_per_tick() {
        let (mut task, mut link, _, _) = started();

        task.handle_observation(&target(0.2));
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Steer);

        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Ram);
    }

    #[test]
    fn test_height_fraction_also_triggers() {
        let (mut task, mut link, _, _) = started();

        task.handle_observation(&TargetObservation {
            position: (320.0, 192.0),
            size: (1.0, FRAME.1 * 0.04),
            frame_size: FRAME,
        });
        task.periodic(&mut link).unwrap();
        assert_eq!(task.phase(), TaskPhase::Steer);
    }

    #[test]
    fn test_steer_inputs() {
        let (mut task, _, _, _) = started();
        task.phase = TaskPhase::Steer;

        // Centred on the aim point, only forward
        let inputs = task.steer_inputs(&target(0.1));
        let scale = -(0.1f64).ln() / 10.0;
        assert!((inputs[&InputChannel::Forward] - scale * 0.9).abs() < 1e-9);
        assert!(inputs[&InputChannel::Yaw].abs() < 1e-9);
        assert!(inputs[&InputChannel::Pitch].abs() < 1e-9);
        assert!(inputs[&InputChannel::Throttle].abs() < 1e-9);

        // Right of and above the aim point: yaw right, pitch and throttle up
        let mut obs = target(0.1);
        obs.position = (480.0, 72.0);
        let inputs = task.steer_inputs(&obs);
        assert!((inputs[&InputChannel::Yaw] - 0.5 * scale * 0.55).abs() < 1e-9);
        assert!((inputs[&InputChannel::Pitch] - 0.5 * scale * 0.55).abs() < 1e-9);
        assert!((inputs[&InputChannel::Throttle] - 0.5 * scale * 0.45).abs() < 1e-9);

        // Large targets are floored at a scale of 0.1
        let inputs = task.steer_inputs(&target(0.9));
        assert!((inputs[&InputChannel::Forward] - 0.09).abs() < 1e-9);

        // A zero width target doesn't blow up the scale
        let mut obs = target(0.1);
        obs.size = (0.0, 0.0);
        let inputs = task.steer_inputs(&obs);
        assert!(inputs.values().all(|v| v.is_finite() && v.abs() <= 1.0));

        task.last_obs = Some(target(0.1));
        assert_eq!(task.inputs(), task.steer_inputs(&target(0.1)));
    }

    #[test]
    fn test_finish_on_timeout() {
        let (mut task, mut link, _, clock) = started();
        task.handle_observation(&target(0.1));

        clock.set(101.99);
        assert!(!task.is_finished());

        clock.set(102.0);
        task.periodic(&mut link).unwrap();
        assert!(!task.is_finished());

        clock.set(599.99);
        assert!(!task.is_finished());

        clock.set(600.0);
        assert!(task.is_finished());
    }

    #[test]
    fn test_never_seen_target_finishes_on_timeout_only() {
        let (mut task, mut link, _, clock) = started();
        let no_target = TargetObservation::no_target(FRAME);

        for &t in &[100.0, 102.0, 300.0, 599.99] {
            clock.set(t);
            task.handle_observation(&no_target);
            task.periodic(&mut link).unwrap();
            assert!(!task.is_finished(), "finished at {}", t);
            assert_eq!(task.phase(), TaskPhase::Crawl);
        }

        clock.set(600.0);
        task.handle_observation(&no_target);
        assert!(task.is_finished());
    }

    #[test]
    fn test_finish_on_target_size() {
        let (mut task, _, _, clock) = started();

        // Target already big, but not before the minimum duration
        task.handle_observation(&target(0.31));
        clock.set(101.0);
        assert!(!task.is_finished());

        clock.set(102.0);
        assert!(task.is_finished());

        // Exactly the end fraction isn't enough
        let (mut task, _, _, clock) = started();
        task.handle_observation(&TargetObservation {
            position: (320.0, 192.0),
            size: (192.0, 144.0),
            frame_size: FRAME,
        });
        clock.set(110.0);
        assert!(!task.is_finished());
    }

    #[test]
    fn test_not_finished_before_initialize() {
        let task = ButtonDocking::new(
            ButtonDockingParams::default(),
            Arc::new(ManualClock::new(1000.0)),
        );
        assert!(!task.is_finished());
    }

    #[test]
    fn test_end_from_any_phase() {
        for &phase in &[TaskPhase::Crawl, TaskPhase::Steer, TaskPhase::Ram] {
            let (mut task, mut link, vehicle, _) = started();
            task.phase = phase;

            task.end(&mut link);

            let sent = vehicle.sent();
            assert_eq!(sent[0], Sent::Mode(19));
            match sent[1] {
                Sent::RcOverride(ref cmd) => {
                    for channel in InputChannel::ALL.iter() {
                        assert_eq!(pwm(cmd, *channel), 1500);
                    }
                }
                ref s => panic!("Expected stop command, got {:?}", s),
            }
        }
    }
}
