//! # Simulated collaborators
//!
//! Deterministic stand-ins for the car's hardware, localisation and perception, used by the
//! executable when running off the car. None of these do any real sensing, they exist so that
//! the driver's timing, fusion and recording can be exercised end to end.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace};
use nalgebra::Vector3;

use car_if::{
    eqpt::{
        cam::yuv420_size,
        car::{CarHw, WheelMotion},
        imu::{Imu, ImuSample},
    },
    loc::{CeilingTracker, ObstacleDetector},
    ui::Display,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Luma of the simulated camera frames.
const GREY_LUMA: u8 = 0x80;

/// Neutral chroma for YUV frames.
const NEUTRAL_CHROMA: u8 = 0x80;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An IMU sitting still on level ground.
#[derive(Debug, Clone)]
pub struct SimImu {
    sample: ImuSample,
}

/// A car without wheel encoders which remembers the last command it was sent.
#[derive(Debug, Clone, Default)]
pub struct SimCar {
    pub leds: u8,
    pub throttle: f32,
    pub steering: f32,
}

/// A tracker which leaves the pose where it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPoseTracker;

/// An obstacle detector which never sees anything.
#[derive(Debug, Clone, Default)]
pub struct EmptyObstacleDetector {
    car: Vec<i32>,
    cone: Vec<i32>,
}

/// A display which writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDisplay;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimImu {
    fn default() -> Self {
        Self {
            sample: ImuSample {
                accel: Vector3::new(0.0, 0.0, 1.0),
                gyro: Vector3::zeros(),
            }
        }
    }
}

impl SimImu {
    pub fn new(sample: ImuSample) -> Self {
        Self {
            sample
        }
    }
}

impl Imu for SimImu {
    fn read_imu(&mut self) -> ImuSample {
        self.sample
    }
}

impl CarHw for SimCar {
    fn wheel_motion(&mut self) -> Option<WheelMotion> {
        None
    }

    fn set_controls(&mut self, leds: u8, throttle: f32, steering: f32) {
        if leds != self.leds {
            debug!("LEDs: {:#04b}", leds);
        }
        self.leds = leds;
        self.throttle = throttle;
        self.steering = steering;
        trace!("Actuation: throttle {:.3}, steering {:.3}", throttle, steering);
    }
}

impl CeilingTracker for HoldPoseTracker {
    fn update(
        &mut self,
        _image: &[u8],
        _threshold: u8,
        _x_grid: f32,
        _y_grid: f32,
        _xytheta: &mut [f32; 3],
        _n_iter: u32,
        _coarse: bool
    ) {}
}

impl ObstacleDetector for EmptyObstacleDetector {
    fn update(&mut self, _image: &[u8], _car_threshold: i32, _cone_threshold: i32) {}

    fn car_penalties(&self) -> &[i32] {
        &self.car
    }

    fn cone_penalties(&self) -> &[i32] {
        &self.cone
    }
}

impl Display for LogDisplay {
    fn update_status(&mut self, message: &str, color: u16) {
        info!("[display {:#06x}] {}", color, message);
    }

    fn update_config(&mut self, names: &[&str], cursor: usize, values: &[i16]) {
        if let (Some(name), Some(value)) = (names.get(cursor), values.get(cursor)) {
            debug!("[display] {} = {}", name, car_if::config::format_fixed(*value));
        }
    }

    fn update_ceiltrack_view(
        &mut self,
        xytheta: &[f32; 3],
        _x_grid_m: f32,
        _y_grid_m: f32,
        _map_width_m: f32,
        _map_height_m: f32
    ) {
        trace!(
            "[display] x {:.2} m, y {:.2} m, theta {:.3} rad",
            xytheta[0], xytheta[1], xytheta[2]
        );
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// A uniform grey YUV 4:2:0 frame.
pub fn grey_frame(width: u16, height: u16) -> Vec<u8> {
    let luma = width as usize * height as usize;
    let mut frame = vec![NEUTRAL_CHROMA; yuv420_size(width, height)];
    for p in frame[..luma].iter_mut() {
        *p = GREY_LUMA;
    }
    frame
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
