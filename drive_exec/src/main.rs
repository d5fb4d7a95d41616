//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs three threads:
//!
//!     - Camera thread, calling `Driver::on_camera_frame` for every camera frame
//!     - Control loop (this thread), calling `Driver::on_control_frame` every control period
//!     - Flush thread, writing recorded frames to storage
//!
//! Off the car the camera, IMU and actuators are simulated (see `drive_lib::sim`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::{
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use car_if::{
    config::TomlConfigStore,
    eqpt::cam::{FRAME_HEIGHT, FRAME_WIDTH},
};
use drive_lib::{
    ctrl::ManualController,
    driver::{Collaborators, Driver},
    params::DriveExecParams,
    rec::{FlushThread, STDOUT_SINK_NAME},
    sim,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    params::LoadError,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the executable's parameter file in the params directory.
const PARAMS_FILE: &str = "drive_exec.toml";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Drive the car.
#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec")]
struct Opt {
    /// Path to the parameter file, by default `params/drive_exec.toml` under the software root.
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Start recording immediately to this file, `-` for standard output (requires `--quiet`).
    #[structopt(long)]
    record: Option<String>,

    /// Number of camera frames to skip between recorded frames.
    #[structopt(long, default_value = "0")]
    frameskip: u32,

    /// Stop after this many seconds.
    #[structopt(long)]
    duration_s: Option<f64>,

    /// Only log to the session log file.
    #[structopt(long)]
    quiet: bool,
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
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, !opt.quiet, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    if opt.record.as_deref() == Some(STDOUT_SINK_NAME) && !opt.quiet {
        return Err(eyre!("Recording to standard output requires --quiet"))
    }

    // ---- LOAD PARAMETERS ----

    let mut params: DriveExecParams = match opt.params {
        Some(ref path) => util::params::load_path(path)
            .wrap_err_with(|| format!("Could not load exec params from {:?}", path))?,
        None => match util::params::load(PARAMS_FILE) {
            Ok(p) => p,
            Err(LoadError::FileLoadError(e)) => {
                warn!("Could not read {} ({}), using default parameters", PARAMS_FILE, e);
                DriveExecParams::default()
            },
            Err(e) => return Err(e).wrap_err("Could not load exec params")
        }
    };

    // Recordings from the gamepad go into the session unless told otherwise
    if params.driver.rec_dir.is_none() {
        params.driver.rec_dir = Some(session.rec_root.clone());
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let config_path = host::get_sw_root()
        .wrap_err("Could not find the software root")?
        .join(&params.config_file);

    let (flush_queue, flush_thread) = FlushThread::spawn(params.flush_queue_depth)
        .wrap_err("Failed to start the flush thread")?;

    let driver = Arc::new(Driver::new(params.driver.clone(), Collaborators {
        tracker: Box::new(sim::HoldPoseTracker),
        detector: Box::new(sim::EmptyObstacleDetector::default()),
        imu: Box::new(sim::SimImu::default()),
        controller: Box::new(ManualController::new()),
        config_store: Box::new(TomlConfigStore::new(config_path)),
        pipeline: Box::new(flush_queue),
        input: None,
        display: Some(Box::new(sim::LogDisplay)),
    }));
    info!("Driver initialised");

    if let Some(ref name) = opt.record {
        driver.start_recording(name, opt.frameskip)
            .wrap_err("Failed to start recording")?;
    }

    // ---- CAMERA THREAD ----

    let camera_thread = {
        let driver = driver.clone();
        let period = Duration::from_secs_f64(params.camera_period_s);
        let frame = sim::grey_frame(FRAME_WIDTH, FRAME_HEIGHT);

        thread::Builder::new()
            .name("camera".into())
            .spawn(move || {
                while !driver.is_done() {
                    let start = Instant::now();
                    driver.on_camera_frame(&frame);
                    if let Some(d) = period.checked_sub(start.elapsed()) {
                        thread::sleep(d);
                    }
                }
            })
            .wrap_err("Failed to start the camera thread")?
    };

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut car = sim::SimCar::default();
    let cycle_period = Duration::from_secs_f64(params.control_period_s);
    let exec_start = Instant::now();
    let mut last_cycle = exec_start;
    let mut num_consec_cycle_overruns: u64 = 0;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let dt = (cycle_start_instant - last_cycle).as_secs_f32();
        last_cycle = cycle_start_instant;

        if let Some(limit) = opt.duration_s {
            if (cycle_start_instant - exec_start).as_secs_f64() >= limit {
                info!("Run duration of {} s reached, stopping", limit);
                driver.quit();
            }
        }

        if !driver.on_control_frame(&mut car, dt) {
            break
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                num_consec_cycle_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64(),
                    num_consec_cycle_overruns
                );
            }
        }
    }

    // ---- SHUTDOWN ----

    camera_thread.join()
        .map_err(|_| eyre!("The camera thread panicked"))?;

    if driver.frame_gaps() > 0 {
        warn!("{} late camera frames during the run", driver.frame_gaps());
    }

    // Dropping the driver closes any open recording and releases the flush queue
    drop(driver);

    let stats = flush_thread.join()
        .map_err(|_| eyre!("The flush thread panicked"))?;
    info!(
        "Recorded {} frames ({} bytes), {} dropped, {} lost",
        stats.entries_written, stats.bytes_written, stats.entries_dropped, stats.entries_lost
    );

    info!("End of execution");

    Ok(())
}
