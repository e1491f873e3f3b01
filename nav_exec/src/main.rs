//! Navigation control executable entry point.
//!
//! Runs a single mission against the simulated robot:
//!
//!     nav_exec [--verbose] [--trace-ticks] homing [--lock-offset-rad <rad>]
//!     nav_exec [--verbose] [--trace-ticks] waypoint
//!
//! Parameters are loaded from `$NAV_SW_ROOT/params`. Each run creates a new session directory
//! holding the log, a per-tick trace (`arch/ticks.csv`) and a summary of the mission result.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::interrupt::Interrupt;
use log::{info, warn};
use serde::Serialize;
use std::{collections::VecDeque, thread};
use structopt::StructOpt;

// Internal
use nav_lib::{
    ctrl::{CtrlParams, PhaseExit},
    homing::{run_homing, HomingParams},
    iface::InterruptFlag,
    params::NavExecParams,
    per::CameraMode,
    sim::{SimParams, SimRover},
    waypoint::{WaypointFollower, WaypointParams},
    TICK_LOG_TARGETS,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::secs_to_duration,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed loop navigation control
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opt {
    /// Log at trace level rather than debug.
    #[structopt(short, long)]
    verbose: bool,

    /// Also log every control tick when verbose.
    #[structopt(long)]
    trace_ticks: bool,

    #[structopt(subcommand)]
    mission: Mission,
}

/// The mission to run.
#[derive(Debug, StructOpt)]
enum Mission {
    /// Find, align with and approach the homing target.
    #[structopt(name = "homing")]
    Homing {
        /// Finish by locking the heading to the target's orientation plus this offset.
        #[structopt(long)]
        lock_offset_rad: Option<f64>,
    },

    /// Drive through the waypoints listed in the executable parameters.
    #[structopt(name = "waypoint")]
    Waypoint,
}

/// Summary of a waypoint run, archived at the end of the mission.
#[derive(Debug, Serialize)]
struct WaypointSummary {
    complete: bool,
    num_reached: usize,
    num_ticks: u64,
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
    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, keeping the per-tick records out unless asked for
    let min_level = if opt.verbose {
        LevelFilter::Trace
    }
    else {
        LevelFilter::Debug
    };
    let tick_cap = if opt.trace_ticks {
        LevelFilter::Trace
    }
    else {
        LevelFilter::Debug
    };
    let caps: Vec<_> = TICK_LOG_TARGETS.iter().map(|t| (*t, tick_cap)).collect();
    logger_init(min_level, &caps, &session).wrap_err("Failed to initialise logging")?;

    info!("Navigation Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: NavExecParams =
        util::params::load("nav_exec.toml").wrap_err("Could not load exec params")?;
    let ctrl_params: CtrlParams =
        util::params::load("ctrl.toml").wrap_err("Could not load control params")?;
    let homing_params: HomingParams =
        util::params::load("homing.toml").wrap_err("Could not load homing params")?;
    let waypoint_params: WaypointParams =
        util::params::load("waypoint.toml").wrap_err("Could not load waypoint params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    exec_params
        .validate()
        .wrap_err("Invalid exec params")?;
    ctrl_params
        .validate()
        .wrap_err("Invalid control params")?;
    homing_params
        .validate()
        .wrap_err("Invalid homing params")?;
    sim_params.validate().wrap_err("Invalid sim params")?;

    info!("Parameters loaded");

    if !exec_params.is_sim {
        return Err(eyre!(
            "No connection to a physical robot is available, set `is_sim` in nav_exec.toml"
        ));
    }

    let cam_mode = CameraMode::resolve(exec_params.is_sim, &exec_params.published_topics);

    // ---- INITIALISE ROBOT ----

    // Abort the mission if it runs for too long
    let interrupt = InterruptFlag::new();
    {
        let interrupt = interrupt.clone();
        let timeout = secs_to_duration(exec_params.mission_timeout_s);
        thread::spawn(move || {
            thread::sleep(timeout);
            warn!("Mission timed out after {:?}", timeout);
            interrupt.raise(Interrupt::Shutdown);
        });
    }

    let (sim, exec) = SimRover::with_exec(sim_params, ctrl_params, interrupt)
        .wrap_err("Failed to initialise the simulator")?;
    let mut exec = exec.with_archiver(
        Archiver::from_path(&session, "ticks.csv").wrap_err("Failed to open the tick trace")?,
    );

    info!("Control executive initialised: {:?}\n", exec);

    // ---- RUN MISSION ----

    match opt.mission {
        Mission::Homing { lock_offset_rad } => {
            info!("Starting homing mission with the {:?} camera", cam_mode);

            let report = run_homing(&mut exec, &homing_params, lock_offset_rad)
                .wrap_err("Homing failed")?;

            info!("Homing result: {:#?}", report);

            session
                .save_json("homing.json", &report.summary())
                .wrap_err("Failed to save the homing summary")?;
        }
        Mission::Waypoint => {
            info!(
                "Starting waypoint mission through {} points",
                exec_params.waypoints.len()
            );

            let path: VecDeque<(f64, f64)> = exec_params.waypoints.iter().copied().collect();
            let mut follower = WaypointFollower::new(waypoint_params, Box::new(path));

            let exit = exec.run(&mut follower).wrap_err("Waypoint following failed")?;

            if let PhaseExit::Cancelled(i) = exit {
                warn!("Waypoint mission cancelled: {}", i);
            }

            session
                .save_json(
                    "waypoint.json",
                    &WaypointSummary {
                        complete: exit.is_complete(),
                        num_reached: follower.num_reached(),
                        num_ticks: exec.num_ticks(),
                    },
                )
                .wrap_err("Failed to save the waypoint summary")?;
        }
    }

    info!("Final pose: {:?}", sim.pose());
    info!("End of execution");

    Ok(())
}
