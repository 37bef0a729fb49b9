//! Main ROV-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Open the vehicle link and side-channel dispatcher
//!     - Main loop:
//!         - Vehicle link polling and event handling
//!         - Telecommand processing
//!         - Task processing
//!         - Cycle management
//!
//! # Usage
//!
//! `rov_exec [script]` - with a script the TCs in it are executed at their timestamps and the
//! executable stops at the end of the script. Without one the executable only maintains the
//! vehicle link.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::WrapErr};
use structopt::StructOpt;

// Internal
use rov_lib::{
    actuator::ActuatorInterface,
    clock::{Clock, SessionClock},
    dispatcher::AsyncCommandDispatcher,
    link::mavlink_io::MavlinkIo,
    params::RovExecParams,
    perception::ObservationFeed,
    task::{ButtonDockingParams, TaskFactory, TaskRunner},
    tc_processor::{self, TcTarget},
    vehicle_link::{LinkEvent, LinkEventKind, VehicleLink},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingTcs},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "rov_exec", about = "ROV control executable")]
struct Opt {
    /// TC script to execute
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum level of log messages, at most info
    #[structopt(long, default_value = "trace")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "rov_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("ROV Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params: RovExecParams = util::params::load(
        "rov_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let docking_params: ButtonDockingParams = util::params::load(
        "button_docking.toml"
    ).wrap_err("Could not load button docking params")?;

    info!("Exec parameters loaded");

    let cycle_period = Duration::from_secs_f64(params.cycle_period_s);

    // ---- INITIALISE TC SOURCE ----

    let mut script = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        },
        None => {
            info!("No script provided, only the vehicle link will be maintained\n");
            None
        }
    };

    // ---- INITIALISE VEHICLE LINK ----

    info!("Initialising vehicle link");

    let clock: Arc<dyn Clock> = Arc::new(SessionClock::new(&session));

    let io = MavlinkIo::connect(&params.mavlink_endpoint)
        .wrap_err("Failed to open the vehicle link")?;

    let dispatcher = AsyncCommandDispatcher::new(&params.dispatcher, &params.net);
    info!(
        "Side-channel dispatcher started with {} workers",
        params.dispatcher.num_workers
    );

    let mut vehicle = VehicleLink::new(
        Box::new(io),
        Box::new(dispatcher),
        clock.clone(),
        &params.link
    );

    vehicle.subscribe(LinkEventKind::Depth, Box::new(|e: &LinkEvent| {
        if let LinkEvent::Depth(d) = e {
            trace!("Depth: {:.02} m", d);
        }
    }));

    // ---- INITIALISE TASKS ----

    let mut runner = TaskRunner::new();
    let factory = TaskFactory::new(clock.clone(), docking_params);
    let feed = ObservationFeed::new();
    let obs_tx = feed.sender();

    info!("Initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- VEHICLE LINK ----

        for event in vehicle.poll() {
            match event {
                // The camera server may have restarted with the vehicle
                LinkEvent::Connected => vehicle.send_camera_state(),
                LinkEvent::Disconnected | LinkEvent::Disarmed => {
                    if runner.is_running() {
                        warn!("Vehicle {:?}, aborting the running task", event);
                        runner.abort(&mut vehicle);
                    }
                },
                _ => ()
            }
        }

        // ---- TELECOMMAND PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending_tcs(clock.now_s()) {
                PendingTcs::None => (),
                PendingTcs::Some(tcs) => {
                    let mut target = TcTarget {
                        vehicle: &mut vehicle,
                        runner: &mut runner,
                        factory: &factory,
                        observations: &obs_tx,
                    };

                    for tc in tcs.iter() {
                        tc_processor::exec(&mut target, tc);
                    }
                },
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break
                }
            }
        }

        // ---- TASK PROCESSING ----

        runner.tick(&mut vehicle, &feed);

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            )
        }
    }

    // ---- SHUTDOWN ----

    runner.abort(&mut vehicle);

    if let Err(e) = vehicle.stop_all() {
        warn!("Could not stop thrusters: {}", e);
    }

    // Dropping the link waits for queued side-channel commands to be sent
    drop(vehicle);

    info!("End of execution");

    Ok(())
}
