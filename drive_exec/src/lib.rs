//! # Drive library.
//!
//! The real-time driving core of the car: the [`driver::Driver`] and everything it needs to fuse
//! the sensors, actuate the car and record what it saw.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Shared vehicle state and its recorded form
pub mod car_state;

/// Controllers shipped with the executable
pub mod ctrl;

/// The driver - runs the camera and control loops
pub mod driver;

/// Executable parameters
pub mod params;

/// Recording pipeline, frame codec and reader
pub mod rec;

/// Simulated collaborators for running off the car
pub mod sim;

/// Configuration tuning from the gamepad
pub mod tuner;

/// Forward velocity estimation
pub mod vel_est;
