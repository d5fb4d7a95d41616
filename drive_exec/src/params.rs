//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

use crate::driver;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriveExecParams {

    /// Target period of the control loop
    ///
    /// Units: seconds
    pub control_period_s: f64,

    /// Period of the (simulated) camera
    ///
    /// Units: seconds
    pub camera_period_s: f64,

    /// Number of entries the flush queue can hold before recorded frames are dropped
    pub flush_queue_depth: usize,

    /// Path to the driver configuration file, relative to the software root
    pub config_file: PathBuf,

    pub driver: driver::Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DriveExecParams {
    fn default() -> Self {
        Self {
            control_period_s: 0.01,
            camera_period_s: 1.0 / 30.0,
            flush_queue_depth: 64,
            config_file: PathBuf::from("params/driver_config.toml"),
            driver: driver::Params::default(),
        }
    }
}
