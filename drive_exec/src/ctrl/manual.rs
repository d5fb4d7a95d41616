//! # Manual controller
//!
//! Passes the operator's joystick straight through to the actuators. There is no planner, so in
//! autodrive the car is commanded to stop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use log::trace;
use nalgebra::Vector3;

use car_if::{
    chunk::{self, ChunkError, ChunkSerialize, Tag, HEADER_LEN},
    config::DriverConfig,
    ctrl::{Actuation, ControlInputs, Controller},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tag of the manual controller state chunk.
pub const MANUAL_CTRL_TAG: Tag = *b"CMan";

/// Pose (3 floats), velocity, throttle and steering (1 float each) and the autodrive flag.
const PAYLOAD_LEN: usize = 4 * 6 + 1;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualController {
    /// Last pose received, in ground coordinates
    xytheta: [f32; 3],

    /// Last velocity estimate received
    wheel_v: f32,

    /// Last command generated
    command: Actuation,

    autodrive: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ManualController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn xytheta(&self) -> [f32; 3] {
        self.xytheta
    }

    pub fn wheel_v(&self) -> f32 {
        self.wheel_v
    }
}

impl Controller for ManualController {
    fn reset_state(&mut self) {
        *self = Self::default();
    }

    fn update_location(&mut self, _config: &DriverConfig, xytheta: &[f32; 3]) {
        self.xytheta = *xytheta;
    }

    fn plan(&mut self, _config: &DriverConfig, _car_penalties: &[i32], _cone_penalties: &[i32]) {}

    fn update_state(
        &mut self,
        _config: &DriverConfig,
        _accel: &Vector3<f32>,
        _gyro: &Vector3<f32>,
        wheel_v: f32,
        _dt: f32
    ) {
        self.wheel_v = wheel_v;
    }

    fn get_control(
        &mut self,
        _config: &DriverConfig,
        inputs: &ControlInputs,
        _current: Actuation
    ) -> Option<Actuation> {
        self.autodrive = inputs.autodrive;
        self.command = if inputs.autodrive {
            Actuation::default()
        }
        else {
            Actuation {
                throttle: inputs.js_throttle,
                steering: inputs.js_steering,
            }
        };

        trace!("Manual control: {:?}", self.command);
        Some(self.command)
    }
}

impl ChunkSerialize for ManualController {
    fn serialized_size(&self) -> usize {
        HEADER_LEN + PAYLOAD_LEN
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        let len = self.serialized_size();
        chunk::check_space(buf, len)?;
        chunk::write_header(buf, &MANUAL_CTRL_TAG, len)?;

        LittleEndian::write_f32_into(
            &[
                self.xytheta[0], self.xytheta[1], self.xytheta[2],
                self.wheel_v,
                self.command.throttle,
                self.command.steering,
            ],
            &mut buf[HEADER_LEN..len - 1]
        );
        buf[len - 1] = self.autodrive as u8;

        Ok(len)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
