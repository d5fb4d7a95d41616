//! Parameters structure for the driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

use car_if::eqpt::cam::FRAME_WIDTH;
use crate::vel_est::VelEstParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Length of one foot.
///
/// Units: meters
const FOOT_M: f32 = 0.3048;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- CEILING GEOMETRY ----

    /// Height of the ceiling above the camera.
    ///
    /// Units: meters
    pub ceil_height_m: f32,

    /// Spacing of the ceiling lights along x.
    ///
    /// Units: meters
    pub ceil_x_pitch_m: f32,

    /// Spacing of the ceiling lights along y.
    ///
    /// Units: meters
    pub ceil_y_pitch_m: f32,

    /// Pose the car is reset to by the home button.
    ///
    /// Frame: homogeneous ceiling coordinates
    pub home: [f32; 3],

    // ---- CAMERA ----

    /// Gap between camera frames above which a warning is raised.
    ///
    /// Units: seconds
    pub frame_gap_warn_s: f64,

    /// Width of the camera image, written into every recorded frame.
    ///
    /// Units: pixels
    pub frame_width: u16,

    // ---- FUSION ----

    /// Weight given to the previous value when smoothing the gyro.
    pub gyro_smoothing: f32,

    pub vel_est: VelEstParams,

    // ---- DISPLAY ----

    /// Extent of the live map.
    ///
    /// Units: meters
    pub map_width_m: f32,
    pub map_height_m: f32,

    // ---- RECORDING ----

    /// Directory recordings started from the gamepad are written to. If not set the current
    /// directory is used.
    pub rec_dir: Option<PathBuf>,

    /// Prefix of recordings started from the gamepad.
    pub rec_file_prefix: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            ceil_height_m: 8.25 * FOOT_M,
            ceil_x_pitch_m: 10.0 * FOOT_M,
            ceil_y_pitch_m: 12.0 * FOOT_M,
            home: [-3.03, 0.73, 0.0],
            frame_gap_warn_s: 0.1,
            frame_width: FRAME_WIDTH,
            gyro_smoothing: 0.95,
            vel_est: VelEstParams::default(),
            map_width_m: 20.0,
            map_height_m: 10.0,
            rec_dir: None,
            rec_file_prefix: String::from("drive"),
        }
    }
}

impl Params {
    /// Ceiling light spacing along x in homogeneous ceiling units.
    pub fn x_grid(&self) -> f32 {
        self.ceil_x_pitch_m / self.ceil_height_m
    }

    /// Ceiling light spacing along y in homogeneous ceiling units.
    pub fn y_grid(&self) -> f32 {
        self.ceil_y_pitch_m / self.ceil_height_m
    }
}
