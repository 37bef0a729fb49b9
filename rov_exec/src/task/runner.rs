//! # Task runner
//!
//! Runs at most one [`Task`] at a time. The runner is ticked by the main loop at the cycle rate.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};

use super::Task;
use crate::{perception::ObservationFeed, vehicle_link::VehicleLink};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
pub struct TaskRunner {
    current: Option<Box<dyn Task>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a single tick of the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// No task is running
    Idle,

    /// The task ran and will run again next tick
    Running,

    /// The task finished this tick and has been ended
    Finished,

    /// The task failed this tick and has been ended
    Failed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Name of the running task.
    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|t| t.name())
    }

    /// Start a new task, aborting any task which is already running.
    ///
    /// If the task fails to initialise it is ended straight away and not run.
    pub fn start(&mut self, mut task: Box<dyn Task>, vehicle: &mut VehicleLink) -> TaskStatus {
        self.abort(vehicle);

        info!("Starting task {}", task.name());

        match task.initialize(vehicle) {
            Ok(()) => {
                self.current = Some(task);
                TaskStatus::Running
            }
            Err(e) => {
                error!("Task {} failed to initialise: {}", task.name(), e);
                task.end(vehicle);
                TaskStatus::Failed
            }
        }
    }

    /// Run one step of the current task.
    ///
    /// The newest observation from the feed is handed to the task first. The feed is drained even
    /// when idle so a new task never sees observations from before it started.
    pub fn tick(&mut self, vehicle: &mut VehicleLink, feed: &ObservationFeed) -> TaskStatus {
        let obs = feed.latest();

        let task = match self.current.as_mut() {
            Some(t) => t,
            None => return TaskStatus::Idle,
        };

        if let Some(ref obs) = obs {
            task.handle_observation(obs);
        }

        let status = match task.periodic(vehicle) {
            Ok(()) if task.is_finished() => {
                info!("Task {} finished", task.name());
                TaskStatus::Finished
            }
            Ok(()) => return TaskStatus::Running,
            Err(e) => {
                error!("Task {} failed, aborting: {}", task.name(), e);
                TaskStatus::Failed
            }
        };

        if let Some(mut task) = self.current.take() {
            task.end(vehicle);
        }

        status
    }

    /// End the current task without waiting for it to finish.
    pub fn abort(&mut self, vehicle: &mut VehicleLink) {
        if let Some(mut task) = self.current.take() {
            warn!("Aborting task {}", task.name());
            task.end(vehicle);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        actuator::{ActuatorError, ActuatorInterface},
        fakes::FakeVehicle,
        task::TaskError,
    };
    use comms_if::eqpt::per::TargetObservation;
    use std::sync::{Arc, Mutex};

    /// Records every lifecycle call, finishing after a number of periodic calls.
    struct ScriptedTask {
        calls: Arc<Mutex<Vec<String>>>,
        finish_after: usize,
        periodics: usize,
        fail_init: bool,
        fail_periodic: bool,
    }

    impl ScriptedTask {
        fn new(calls: &Arc<Mutex<Vec<String>>>, finish_after: usize) -> Self {
            Self {
                calls: calls.clone(),
                finish_after,
                periodics: 0,
                fail_init: false,
                fail_periodic: false,
            }
        }

        fn log(&self, s: &str) {
            self.calls.lock().unwrap().push(s.to_string());
        }

        fn error() -> TaskError {
            TaskError::ActuatorError(ActuatorError::InvalidChannel(0))
        }
    }

    impl Task for ScriptedTask {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn initialize(&mut self, _: &mut VehicleLink) -> Result<(), TaskError> {
            self.log("initialize");
            match self.fail_init {
                true => Err(Self::error()),
                false => Ok(()),
            }
        }

        fn periodic(&mut self, _: &mut VehicleLink) -> Result<(), TaskError> {
            self.log("periodic");
            self.periodics += 1;
            match self.fail_periodic {
                true => Err(Self::error()),
                false => Ok(()),
            }
        }

        fn is_finished(&self) -> bool {
            self.periodics >= self.finish_after
        }

        fn end(&mut self, vehicle: &mut VehicleLink) {
            self.log("end");
            vehicle.stop_all().ok();
        }

        fn handle_observation(&mut self, _: &TargetObservation) {
            self.log("observation");
        }
    }

    fn calls(c: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        c.lock().unwrap().clone()
    }

    #[test]
    fn test_lifecycle_order() {
        let (mut link, _, _) = FakeVehicle::armed_link();
        let feed = ObservationFeed::new();
        let c = Arc::new(Mutex::new(Vec::new()));
        let mut runner = TaskRunner::new();

        assert_eq!(runner.tick(&mut link, &feed), TaskStatus::Idle);

        runner.start(Box::new(ScriptedTask::new(&c, 2)), &mut link);
        assert!(runner.is_running());

        feed.sender().send(TargetObservation::no_target((640.0, 480.0)));
        assert_eq!(runner.tick(&mut link, &feed), TaskStatus::Running);
        assert_eq!(runner.tick(&mut link, &feed), TaskStatus::Finished);
        assert!(!runner.is_running());
        assert_eq!(runner.tick(&mut link, &feed), TaskStatus::Idle);

        assert_eq!(
            calls(&c),
            vec!["initialize", "observation", "periodic", "periodic", "end"]
        );
    }

    #[test]
    fn test_abort_ends_once() {
        let (mut link, _, _) = FakeVehicle::armed_link();
        let feed = ObservationFeed::new();
        let c = Arc::new(Mutex::new(Vec::new()));
        let mut runner = TaskRunner::new();

        runner.start(Box::new(ScriptedTask::new(&c, 100)), &mut link);
        runner.tick(&mut link, &feed);
        runner.abort(&mut link);
        runner.abort(&mut link);

        assert_eq!(calls(&c), vec!["initialize", "periodic", "end"]);
    }

    #[test]
    fn test_start_replaces_running_task() {
        let (mut link, _, _) = FakeVehicle::armed_link();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        let mut runner = TaskRunner::new();

        runner.start(Box::new(ScriptedTask::new(&first, 100)), &mut link);
        runner.start(Box::new(ScriptedTask::new(&second, 100)), &mut link);

        assert_eq!(calls(&first), vec!["initialize", "end"]);
        assert_eq!(calls(&second), vec!["initialize"]);
        assert!(runner.is_running());
    }

    #[test]
    fn test_failures_end_task() {
        let (mut link, _, _) = FakeVehicle::armed_link();
        let feed = ObservationFeed::new();
        let mut runner = TaskRunner::new();

        let c = Arc::new(Mutex::new(Vec::new()));
        let mut task = ScriptedTask::new(&c, 100);
        task.fail_init = true;
        assert_eq!(runner.start(Box::new(task), &mut link), TaskStatus::Failed);
        assert!(!runner.is_running());
        assert_eq!(calls(&c), vec!["initialize", "end"]);

        let c = Arc::new(Mutex::new(Vec::new()));
        let mut task = ScriptedTask::new(&c, 100);
        task.fail_periodic = true;
        runner.start(Box::new(task), &mut link);
        assert_eq!(runner.tick(&mut link, &feed), TaskStatus::Failed);
        assert!(!runner.is_running());
        assert_eq!(calls(&c), vec!["initialize", "periodic", "end"]);
    }

    #[test]
    fn test_stale_observations_dropped() {
        let (mut link, _, _) = FakeVehicle::armed_link();
        let feed = ObservationFeed::new();
        let c = Arc::new(Mutex::new(Vec::new()));
        let mut runner = TaskRunner::new();

        feed.sender().send(TargetObservation::no_target((640.0, 480.0)));
        runner.tick(&mut link, &feed);

        runner.start(Box::new(ScriptedTask::new(&c, 100)), &mut link);
        runner.tick(&mut link, &feed);

        assert_eq!(calls(&c), vec!["initialize", "periodic"]);
    }
}
