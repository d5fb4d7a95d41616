//! # Controllers
//!
//! Controllers shipped with the executable. Planning algorithms live outside of the driver, which
//! only needs something implementing [`car_if::ctrl::Controller`].

pub mod manual;

pub use manual::ManualController;
