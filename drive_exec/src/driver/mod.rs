//! # Driver
//!
//! The driver ties the car together. It is driven by two independent clocks:
//!
//! - [`Driver::on_camera_frame`], once per camera frame (~30 Hz), runs localisation, obstacle
//!   detection and planning, and records the frame if a recording is in progress.
//! - [`Driver::on_control_frame`], once per control tick (~100 Hz), polls the gamepad, reads the
//!   IMU, estimates the velocity and actuates the car.
//!
//! The two may be called concurrently from different threads, so the driver is shared by
//! reference and all of its mutable state sits behind short critical sections, one per logical
//! group:
//!
//! | Group         | Written by                | Lock       |
//! |---------------|---------------------------|------------|
//! | pose          | camera, home event        | `Mutex`    |
//! | dynamics      | control                   | `Mutex`    |
//! | controller    | camera, control, reload   | `Mutex`    |
//! | config        | tuner, reload             | `RwLock`   |
//! | recording     | start/stop, camera        | `Mutex`    |
//!
//! A reader always gets a whole group, so a pose or a dynamics snapshot is never torn. Groups
//! read one after the other may come from different ticks. Locks are never taken while holding
//! the config lock, and the controller lock is only ever taken last, which keeps the lock order
//! acyclic.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod events;
mod params;
mod recording;

#[cfg(test)]
pub mod test_util;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{info, trace, warn};
use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    Mutex, RwLock,
};

use car_if::{
    config::{ConfigStore, DriverConfig},
    ctrl::{ControlInputs, Controller},
    eqpt::{
        car::{CarHw, LED_BLINK, LED_RECORDING},
        imu::Imu,
    },
    input::InputSource,
    loc::{CeilingTracker, ObstacleDetector},
    ui::Display,
};
use util::{
    sync::{lock, read},
    time,
};

use crate::{
    car_state::{self, CarState, GyroFilter},
    rec::RecordingPipeline,
    tuner::ConfigTuner,
    vel_est::VelocityEstimator,
};

pub use params::Params;
pub use recording::RecordingSession;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Luminance threshold for ceiling lights.
const CEILTRACK_THRESHOLD: u8 = 240;

/// Number of localisation refinement iterations per frame.
const CEILTRACK_N_ITER: u32 = 2;

/// Whether localisation runs its coarse search.
const CEILTRACK_COARSE: bool = false;

// TODO: move the detection thresholds into DriverConfig so they can be tuned from the gamepad
/// Obstacle detection thresholds for cars and cones.
const CAR_THRESHOLD: i32 = 40;
const CONE_THRESHOLD: i32 = 150;

/// Full scale of the joystick axes.
const JS_FULL_SCALE: f32 = 32767.0;

/// Bit of the frame counter driving the blinking LED.
const LED_BLINK_FRAME_BIT: u32 = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The collaborators the driver needs.
pub struct Collaborators {
    pub tracker: Box<dyn CeilingTracker>,
    pub detector: Box<dyn ObstacleDetector>,
    pub imu: Box<dyn Imu>,
    pub controller: Box<dyn Controller>,
    pub config_store: Box<dyn ConfigStore>,
    pub pipeline: Box<dyn RecordingPipeline>,
    pub input: Option<Box<dyn InputSource>>,
    pub display: Option<Box<dyn Display>>,
}

/// The driver.
pub struct Driver {
    params: Params,

    state: CarState,

    config: RwLock<DriverConfig>,

    controller: Mutex<Box<dyn Controller>>,

    config_store: Box<dyn ConfigStore>,

    pipeline: Box<dyn RecordingPipeline>,

    camera: Mutex<CameraCtx>,

    control: Mutex<ControlCtx>,

    gyro: Mutex<GyroFilter>,

    input: Option<Mutex<Box<dyn InputSource>>>,

    operator: Mutex<OperatorInput>,

    tuner: Mutex<ConfigTuner>,

    display: Option<Mutex<Box<dyn Display>>>,

    recording: Mutex<Option<RecordingSession>>,

    next_sink_id: AtomicU32,

    /// Camera frames since the last recorded frame (or since startup when not recording)
    frame: AtomicU32,

    /// Number of camera frame gaps over the warning threshold
    frame_gaps: AtomicU64,

    done: AtomicBool,
}

/// State only touched by the camera path.
struct CameraCtx {
    tracker: Box<dyn CeilingTracker>,
    detector: Box<dyn ObstacleDetector>,
    last_t: Option<DateTime<Utc>>,
}

/// State only touched by the control path.
struct ControlCtx {
    imu: Box<dyn Imu>,
    vel_est: VelocityEstimator,
}

/// Latest operator commands from the gamepad.
#[derive(Debug, Clone, Copy, Default)]
struct OperatorInput {
    js_throttle: i16,
    js_steering: i16,
    autodrive: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Driver {
    /// Create a new driver, loading the configuration from the store.
    ///
    /// If the configuration can't be loaded the defaults are used.
    pub fn new(params: Params, collab: Collaborators) -> Self {
        let config = match collab.config_store.load() {
            Ok(c) => {
                info!("Loaded driver configuration");
                c
            },
            Err(e) => {
                warn!("Could not load the driver configuration, using defaults: {}", e);
                DriverConfig::default()
            }
        };

        Self {
            state: CarState::new(params.home),
            config: RwLock::new(config),
            controller: Mutex::new(collab.controller),
            config_store: collab.config_store,
            pipeline: collab.pipeline,
            camera: Mutex::new(CameraCtx {
                tracker: collab.tracker,
                detector: collab.detector,
                last_t: None,
            }),
            control: Mutex::new(ControlCtx {
                imu: collab.imu,
                vel_est: VelocityEstimator::new(params.vel_est),
            }),
            gyro: Mutex::new(GyroFilter::new(params.gyro_smoothing)),
            input: collab.input.map(Mutex::new),
            operator: Mutex::new(OperatorInput::default()),
            tuner: Mutex::new(ConfigTuner::new()),
            display: collab.display.map(Mutex::new),
            recording: Mutex::new(None),
            next_sink_id: AtomicU32::new(0),
            frame: AtomicU32::new(0),
            frame_gaps: AtomicU64::new(0),
            done: AtomicBool::new(false),
            params,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The shared vehicle state.
    pub fn state(&self) -> &CarState {
        &self.state
    }

    /// Copy of the current driver configuration.
    pub fn config(&self) -> DriverConfig {
        *read(&self.config)
    }

    /// Current value of the camera frame counter.
    pub fn frame(&self) -> u32 {
        self.frame.load(Ordering::Relaxed)
    }

    /// Number of camera frames which arrived late since startup.
    pub fn frame_gaps(&self) -> u64 {
        self.frame_gaps.load(Ordering::Relaxed)
    }

    /// Ask the control loop to stop.
    pub fn quit(&self) {
        self.done.store(true, Ordering::Relaxed);
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    /// The LED status byte.
    pub fn leds(&self) -> u8 {
        let mut leds = 0;
        if self.frame() & LED_BLINK_FRAME_BIT != 0 {
            leds |= LED_BLINK;
        }
        if self.is_recording() {
            leds |= LED_RECORDING;
        }
        leds
    }

    /// Process one camera frame.
    pub fn on_camera_frame(&self, image: &[u8]) {
        self.on_camera_frame_at(Utc::now(), image)
    }

    /// Process one camera frame captured at `t`.
    pub fn on_camera_frame_at(&self, t: DateTime<Utc>, image: &[u8]) {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        // The frame counter is reset by recording, so the first frame is the one without a
        // previous timestamp
        let dt = {
            let mut cam = lock(&self.camera);
            let dt = cam.last_t.map(|last| time::duration_to_seconds(t - last).unwrap_or(0.0));
            cam.last_t = Some(t);
            dt
        };

        if let Some(gap) = dt.filter(|&dt| dt > self.params.frame_gap_warn_s) {
            self.frame_gaps.fetch_add(1, Ordering::Relaxed);
            warn!("{:.3} s gap between camera frames", gap);
        }

        self.update_from_camera(image, dt.unwrap_or(0.0) as f32);

        self.record_frame(&t, image, frame);
    }

    /// Update localisation, perception and planning from a camera frame.
    pub fn update_from_camera(&self, image: &[u8], dt: f32) {
        let config = self.config();
        let x_grid = self.params.x_grid();
        let y_grid = self.params.y_grid();

        let mut cam = lock(&self.camera);
        let cam = &mut *cam;

        // Refine the pose outside of the pose lock
        let from = self.state.pose();
        let mut pos = from.pos;
        cam.tracker.update(
            image,
            CEILTRACK_THRESHOLD,
            x_grid,
            y_grid,
            &mut pos,
            CEILTRACK_N_ITER,
            CEILTRACK_COARSE
        );
        if !self.state.publish_pose(&from, pos) {
            trace!("Car homed during localisation, discarding the update");
            pos = self.state.ceiltrack_pos();
        }

        let xytheta = car_state::ceiling_to_ground(&pos, self.params.ceil_height_m);

        cam.detector.update(image, CAR_THRESHOLD, CONE_THRESHOLD);

        {
            let mut controller = lock(&self.controller);
            controller.update_location(&config, &xytheta);
            controller.plan(&config, cam.detector.car_penalties(), cam.detector.cone_penalties());
        }

        trace!("Camera update: xytheta = {:?}, dt = {:.4}", xytheta, dt);

        self.with_display(|d| d.update_ceiltrack_view(
            &xytheta,
            x_grid * self.params.ceil_height_m,
            y_grid * self.params.ceil_height_m,
            self.params.map_width_m,
            self.params.map_height_m
        ));
    }

    /// Run one control tick, returning false once the driver has been asked to stop.
    pub fn on_control_frame(&self, car: &mut dyn CarHw, dt: f32) -> bool {

        // ---- INPUT ----

        // Events are collected first so their handlers don't run under the input lock
        let events = match self.input {
            Some(ref input) => lock(input).read_input(),
            None => Vec::new()
        };
        for event in events {
            self.handle_input(event);
        }

        // ---- FUSION ----

        let wheel = car.wheel_motion();

        let dynamics = {
            let mut ctx = lock(&self.control);
            let sample = ctx.imu.read_imu();
            let gyro = lock(&self.gyro).update(&sample.gyro);

            let vel_est = &ctx.vel_est;
            self.state.update_dynamics(|d| {
                d.accel = sample.accel;
                d.gyro = gyro;
                vel_est.update(d, wheel, dt);
                *d
            })
        };

        // ---- CONTROL ----

        let config = self.config();
        let operator = *lock(&self.operator);
        let inputs = ControlInputs {
            js_throttle: operator.js_throttle as f32 / JS_FULL_SCALE,
            js_steering: operator.js_steering as f32 / JS_FULL_SCALE,
            dt,
            autodrive: operator.autodrive,
            frame: self.frame(),
        };

        let actuation = {
            let mut controller = lock(&self.controller);
            controller.update_state(
                &config, &dynamics.accel, &dynamics.gyro, dynamics.wheel_v, dt
            );
            controller.get_control(&config, &inputs, dynamics.actuation())
        };

        if let Some(u) = actuation {
            car.set_controls(self.leds(), u.throttle, u.steering);
            self.state.update_dynamics(|d| d.set_actuation(u));
            trace!("Control: {:?}, v = {:.3}", u, dynamics.wheel_v);
        }

        !self.is_done()
    }

    /// Run `f` on the display, if there is one.
    fn with_display<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn Display)
    {
        if let Some(ref display) = self.display {
            f(&mut **lock(display));
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
