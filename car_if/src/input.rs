//! # Operator Input
//!
//! Gamepad events consumed by the driver. Gamepad drivers identify directions and buttons by
//! single characters, which are mapped to these enums with the `from_char` functions.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Directional pad directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DPad {
    Up,
    Down,
    Left,
    Right,
}

/// Gamepad buttons used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// `+`, start recording
    Start,

    /// `-`, stop recording
    Select,

    /// `H`, reset to the starting line and capture the gyro bias
    Home,

    /// `L`, held to enable autodrive
    Autodrive,

    /// `B`, reset the controller and reload the configuration
    Reload,

    /// `A`, save the configuration
    Save,

    /// `X`, held to adjust configuration values in steps of 10
    ModX,

    /// `Y`, held to adjust configuration values in steps of 100
    ModY,
}

/// Analog axes used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left stick vertical, up is negative
    LeftStickY,

    /// Right stick horizontal
    RightStickX,
}

/// A single input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    DPadPress(DPad),
    ButtonPress(Button),
    ButtonRelease(Button),
    AxisMove(Axis, i16),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A gamepad, polled once per control tick.
pub trait InputSource: Send {
    /// Return all events which occured since the last read.
    fn read_input(&mut self) -> Vec<InputEvent>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DPad {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'U' => Some(DPad::Up),
            'D' => Some(DPad::Down),
            'L' => Some(DPad::Left),
            'R' => Some(DPad::Right),
            _ => None
        }
    }
}

impl Button {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Button::Start),
            '-' => Some(Button::Select),
            'H' => Some(Button::Home),
            'L' => Some(Button::Autodrive),
            'B' => Some(Button::Reload),
            'A' => Some(Button::Save),
            'X' => Some(Button::ModX),
            'Y' => Some(Button::ModY),
            _ => None
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Button::Start => '+',
            Button::Select => '-',
            Button::Home => 'H',
            Button::Autodrive => 'L',
            Button::Reload => 'B',
            Button::Save => 'A',
            Button::ModX => 'X',
            Button::ModY => 'Y',
        }
    }
}

impl Axis {
    /// Map a raw gamepad axis index to an axis, or `None` if the driver doesn't use it.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Axis::LeftStickY),
            2 => Some(Axis::RightStickX),
            _ => None
        }
    }
}
