//! # Car Hardware Interface

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// LED bit which blinks while the control loop runs.
pub const LED_BLINK: u8 = 0b01;

/// LED bit which is lit while a recording is in progress.
pub const LED_RECORDING: u8 = 0b10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Motion measured by the wheel encoders since the last read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelMotion {
    /// Distance travelled since the last read.
    ///
    /// Units: meters
    pub ds: f32,

    /// Forward velocity.
    ///
    /// Units: meters/second
    pub v: f32,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Hardware interface handed to the control loop every tick.
pub trait CarHw {
    /// Read the wheel encoders, or `None` if the car has no wheel encoders.
    fn wheel_motion(&mut self) -> Option<WheelMotion>;

    /// Command the actuators.
    ///
    /// `throttle` and `steering` are fractions in `[-1, 1]`, `leds` is a bitfield of the
    /// `LED_*` constants.
    fn set_controls(&mut self, leds: u8, throttle: f32, steering: f32);
}
