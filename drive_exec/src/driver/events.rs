//! Gamepad event handling

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Local};
use log::{info, warn};
use std::path::PathBuf;

use car_if::{
    config::{format_fixed, DriverConfig, CONFIG_FIELDS},
    input::{Axis, Button, DPad, InputEvent},
    ui::{COLOR_GREEN, COLOR_RED, COLOR_WHITE, COLOR_YELLOW},
};
use util::sync::{lock, read, write};

use super::Driver;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Format of the timestamp in the names of recordings started from the gamepad.
const REC_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Driver {
    /// Dispatch a gamepad event to its handler.
    pub fn handle_input(&self, event: InputEvent) {
        match event {
            InputEvent::DPadPress(d) => self.on_dpad_press(d),
            InputEvent::ButtonPress(b) => self.on_button_press(b),
            InputEvent::ButtonRelease(b) => self.on_button_release(b),
            InputEvent::AxisMove(a, v) => self.on_axis_move(a, v),
        }
    }

    /// Move the tuner cursor or adjust the selected configuration value.
    pub fn on_dpad_press(&self, dir: DPad) {
        {
            let mut tuner = lock(&self.tuner);
            let mut config = write(&self.config);
            tuner.on_dpad(dir, &mut config);
        }
        self.update_display();
    }

    pub fn on_button_press(&self, button: Button) {
        match button {
            Button::Start => {
                if self.is_recording() {
                    return
                }

                let path = self.recording_path(&Local::now());
                let name = path.display().to_string();
                match self.start_recording(&name, 0) {
                    Ok(()) => self.set_status(&name, COLOR_YELLOW),
                    Err(e) => {
                        warn!("Could not start recording: {}", e);
                        self.set_status("recording failed", COLOR_RED);
                    }
                }
            },
            Button::Select => {
                if self.stop_recording() {
                    self.set_status("recording stopped", COLOR_WHITE);
                }
            },
            Button::Home => {
                self.state.set_home();
                let bias = lock(&self.gyro).capture_bias();
                info!("Reset to the starting line, gyro bias {:.3} {:.3} {:.3}",
                    bias[0], bias[1], bias[2]
                );
                self.set_status("starting line", COLOR_GREEN);
            },
            Button::Autodrive => {
                let mut op = lock(&self.operator);
                if !op.autodrive {
                    op.autodrive = true;
                    info!("Autodrive ON");
                }
            },
            Button::Reload => {
                lock(&self.controller).reset_state();
                info!("Controller state reset");

                match self.config_store.load() {
                    Ok(c) => {
                        *write(&self.config) = c;
                        info!("Driver configuration loaded");
                        self.update_display();
                        self.set_status("config loaded", COLOR_WHITE);
                    },
                    Err(e) => warn!("Could not load the driver configuration: {}", e)
                }
            },
            Button::Save => {
                let config = self.config();
                match self.config_store.save(&config) {
                    Ok(()) => {
                        info!("Driver configuration saved");
                        self.set_status("config saved", COLOR_WHITE);
                    },
                    Err(e) => warn!("Could not save the driver configuration: {}", e)
                }
            },
            Button::ModX => lock(&self.tuner).set_mod_x(true),
            Button::ModY => lock(&self.tuner).set_mod_y(true),
        }
    }

    pub fn on_button_release(&self, button: Button) {
        match button {
            Button::Autodrive => {
                let mut op = lock(&self.operator);
                if op.autodrive {
                    op.autodrive = false;
                    info!("Autodrive OFF");
                }
            },
            Button::ModX => lock(&self.tuner).set_mod_x(false),
            Button::ModY => lock(&self.tuner).set_mod_y(false),
            _ => ()
        }
    }

    /// Record a joystick axis. Up on the left stick reads negative, so it is inverted to give a
    /// positive throttle.
    pub fn on_axis_move(&self, axis: Axis, value: i16) {
        let mut op = lock(&self.operator);
        match axis {
            Axis::LeftStickY => op.js_throttle = value.saturating_neg(),
            Axis::RightStickX => op.js_steering = value,
        }
    }

    /// Show the field under the tuner cursor.
    pub fn update_display(&self) {
        let cursor = lock(&self.tuner).cursor();
        let config = *read(&self.config);
        let field = &CONFIG_FIELDS[cursor];

        info!("{} {}", field.name, format_fixed((field.get)(&config)));

        self.with_display(|d| d.update_config(&DriverConfig::names(), cursor, &config.values()));
    }

    fn set_status(&self, message: &str, color: u16) {
        self.with_display(|d| d.update_status(message, color));
    }

    /// Path of a recording started at `t` from the gamepad.
    fn recording_path(&self, t: &DateTime<Local>) -> PathBuf {
        let name = format!(
            "{}-{}.rec",
            self.params.rec_file_prefix,
            t.format(REC_TIMESTAMP_FORMAT)
        );

        match self.params.rec_dir {
            Some(ref dir) => dir.join(name),
            None => PathBuf::from(name)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
