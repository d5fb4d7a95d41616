//! # Controller Interface
//!
//! The controller plans a path on each camera frame and generates actuation commands on each
//! control tick. Its internals are outside of the driving core, which only feeds it and records
//! its serialised state.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;

use crate::{chunk::ChunkSerialize, config::DriverConfig};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuation command as fractions of full scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Actuation {
    /// Throttle, between -1 (full reverse/brake) and +1 (full forward)
    pub throttle: f32,

    /// Steering, between -1 and +1
    pub steering: f32,
}

/// Operator inputs and timing passed to the controller on every control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInputs {
    /// Joystick throttle, normalised to `[-1, 1]`
    pub js_throttle: f32,

    /// Joystick steering, normalised to `[-1, 1]`
    pub js_steering: f32,

    /// Time since the last control tick
    ///
    /// Units: seconds
    pub dt: f32,

    /// True while the operator holds the autodrive button
    pub autodrive: bool,

    /// Current camera frame counter, for any periodic behaviour of the controller
    pub frame: u32,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Planner and controller.
pub trait Controller: ChunkSerialize + Send {
    /// Discard all internal state (filters, plans).
    fn reset_state(&mut self);

    /// Update the controller with a new pose in ground coordinates, `[x_m, y_m, theta_rad]`.
    fn update_location(&mut self, config: &DriverConfig, xytheta: &[f32; 3]);

    /// Plan using the penalty maps from the obstacle detector.
    fn plan(&mut self, config: &DriverConfig, car_penalties: &[i32], cone_penalties: &[i32]);

    /// Update the vehicle dynamics estimate.
    fn update_state(
        &mut self,
        config: &DriverConfig,
        accel: &Vector3<f32>,
        gyro: &Vector3<f32>,
        wheel_v: f32,
        dt: f32
    );

    /// Generate a control command.
    ///
    /// `current` is the last command sent to the car. Returns `None` if the controller has no
    /// command for this tick, in which case the car is not actuated.
    fn get_control(
        &mut self,
        config: &DriverConfig,
        inputs: &ControlInputs,
        current: Actuation
    ) -> Option<Actuation>;
}
