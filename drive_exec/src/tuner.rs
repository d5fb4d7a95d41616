//! # Configuration tuner
//!
//! Lets the operator adjust the driver configuration from the gamepad. Up and down move the
//! cursor through the configuration fields (wrapping at either end), left and right decrease or
//! increase the field under the cursor. Holding the X modifier multiplies the step by 10,
//! holding Y by 100.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use car_if::{
    config::{DriverConfig, CONFIG_FIELDS, N_CONFIG_ITEMS},
    input::DPad,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cursor and modifier state of the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigTuner {
    cursor: usize,
    mod_x: bool,
    mod_y: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ConfigTuner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the selected field in `CONFIG_FIELDS`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_mod_x(&mut self, held: bool) {
        self.mod_x = held;
    }

    pub fn set_mod_y(&mut self, held: bool) {
        self.mod_y = held;
    }

    /// Current adjustment step in hundredths.
    pub fn step(&self) -> i16 {
        if self.mod_y {
            100
        }
        else if self.mod_x {
            10
        }
        else {
            1
        }
    }

    /// Handle a dpad press, modifying `config` for left and right.
    pub fn on_dpad(&mut self, dir: DPad, config: &mut DriverConfig) {
        let field = &CONFIG_FIELDS[self.cursor];

        match dir {
            DPad::Up => self.cursor = (self.cursor + 1) % N_CONFIG_ITEMS,
            DPad::Down => self.cursor = (self.cursor + N_CONFIG_ITEMS - 1) % N_CONFIG_ITEMS,
            DPad::Left => (field.set)(config, (field.get)(config).saturating_sub(self.step())),
            DPad::Right => (field.set)(config, (field.get)(config).saturating_add(self.step())),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
