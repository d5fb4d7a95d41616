//! # Equipment Interface
//!
//! This module defines the interfaces to the car's sensors and actuators.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod car;
pub mod imu;
