//! # Car interface crate.
//!
//! Provides the interfaces between the driving core and its collaborators: sensors, actuators,
//! localisation, planning, operator input, the display and configuration persistence.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Self describing chunk headers shared by every recorded blob
pub mod chunk;

/// Tunable driver configuration and its persistence
pub mod config;

/// Controller/planner interface
pub mod ctrl;

/// Sensor and actuator equipment interfaces
pub mod eqpt;

/// Operator input events
pub mod input;

/// Localisation and obstacle detection interfaces
pub mod loc;

/// On-screen display interface
pub mod ui;
