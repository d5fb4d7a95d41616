//! # Vehicle state record
//!
//! The vehicle state is shared between the camera and control loops. It is split into two
//! groups, each behind its own short critical section:
//!
//! - the pose, written by the camera loop (localisation) and the home event,
//! - the dynamics (IMU, velocity, actuation), written by the control loop.
//!
//! Readers always get a whole group at once, so a pose can never be torn between two
//! localisation updates, but a pose and a dynamics snapshot taken one after the other may come
//! from different ticks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use nalgebra::Vector3;
use std::sync::Mutex;

use car_if::{
    chunk::{self, ChunkError, ChunkSerialize, Tag, HEADER_LEN},
    ctrl::Actuation,
};
use util::{maths, sync::lock};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tag of the vehicle state chunk.
pub const CAR_STATE_TAG: Tag = *b"CSt1";

/// Size of the vehicle state chunk payload: throttle and steering (1 byte each), accel and gyro
/// (3 floats each), wheel distance and velocity (1 float each).
pub const CAR_STATE_PAYLOAD_LEN: usize = 2 + 4 * 3 * 2 + 4 * 2;

/// Full scale of the quantised actuation fields.
const ACTUATION_SCALE: f32 = 127.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sensed and derived vehicle dynamics, plus the last actuation command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarDynamics {
    /// Latest accelerometer reading, in g
    pub accel: Vector3<f32>,

    /// Latest gyro reading with the bias removed
    ///
    /// Units: radians/second
    pub gyro: Vector3<f32>,

    /// Last commanded throttle, quantised to `[-127, 127]`
    pub throttle: i8,

    /// Last commanded steering, quantised to `[-127, 127]`
    pub steering: i8,

    /// Distance travelled as reported by the wheel encoders
    ///
    /// Units: meters
    pub wheel_dist: f32,

    /// Forward velocity estimate
    ///
    /// Units: meters/second
    pub wheel_v: f32,
}

/// The shared vehicle state, owned by the driver.
#[derive(Debug)]
pub struct CarState {
    home: [f32; 3],

    pose: Mutex<PoseSlot>,

    dynamics: Mutex<CarDynamics>,
}

/// Homogeneous ceiling coordinates `[x, y, theta]`, along with the number of times the pose has
/// been reset to home.
///
/// Localisation takes a copy of the pose, refines it outside of the lock and publishes it back.
/// If the car was homed in between the refined pose is stale and is discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSlot {
    pub pos: [f32; 3],
    pub homes: u32,
}

/// Exponentially smoothed gyro estimate with a bias captured on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroFilter {
    /// Weight given to the previous smoothed value
    weight: f32,

    smoothed: Vector3<f32>,

    bias: Vector3<f32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CarDynamics {
    fn default() -> Self {
        Self {
            accel: Vector3::zeros(),
            gyro: Vector3::zeros(),
            throttle: 0,
            steering: 0,
            wheel_dist: 0.0,
            wheel_v: 0.0,
        }
    }
}

impl CarDynamics {
    /// The last actuation command, recovered from the quantised fields.
    pub fn actuation(&self) -> Actuation {
        Actuation {
            throttle: self.throttle as f32 / ACTUATION_SCALE,
            steering: self.steering as f32 / ACTUATION_SCALE,
        }
    }

    /// Store an actuation command.
    pub fn set_actuation(&mut self, actuation: Actuation) {
        self.throttle = quantise(actuation.throttle);
        self.steering = quantise(actuation.steering);
    }

    /// Decode a vehicle state chunk.
    pub fn decode(buf: &[u8]) -> Result<Self, ChunkError> {
        let payload = chunk::expect_chunk(buf, &CAR_STATE_TAG)?;
        if payload.len() != CAR_STATE_PAYLOAD_LEN {
            return Err(ChunkError::WrongPayloadSize(CAR_STATE_TAG, payload.len()))
        }

        let mut floats = [0f32; 8];
        LittleEndian::read_f32_into(&payload[2..], &mut floats);

        Ok(Self {
            throttle: payload[0] as i8,
            steering: payload[1] as i8,
            accel: Vector3::new(floats[0], floats[1], floats[2]),
            gyro: Vector3::new(floats[3], floats[4], floats[5]),
            wheel_dist: floats[6],
            wheel_v: floats[7],
        })
    }
}

impl ChunkSerialize for CarDynamics {
    fn serialized_size(&self) -> usize {
        HEADER_LEN + CAR_STATE_PAYLOAD_LEN
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        let len = self.serialized_size();
        chunk::check_space(buf, len)?;
        chunk::write_header(buf, &CAR_STATE_TAG, len)?;

        let payload = &mut buf[HEADER_LEN..len];
        payload[0] = self.throttle as u8;
        payload[1] = self.steering as u8;
        LittleEndian::write_f32_into(
            &[
                self.accel[0], self.accel[1], self.accel[2],
                self.gyro[0], self.gyro[1], self.gyro[2],
                self.wheel_dist,
                self.wheel_v,
            ],
            &mut payload[2..]
        );

        Ok(len)
    }
}

impl CarState {
    /// Create a new state with the car at `home`.
    pub fn new(home: [f32; 3]) -> Self {
        Self {
            home,
            pose: Mutex::new(PoseSlot {
                pos: home,
                homes: 0,
            }),
            dynamics: Mutex::new(CarDynamics::default()),
        }
    }

    /// Reset the pose to the home position.
    pub fn set_home(&self) {
        let mut pose = lock(&self.pose);
        pose.pos = self.home;
        pose.homes = pose.homes.wrapping_add(1);
    }

    /// The home position in homogeneous ceiling coordinates.
    pub fn home(&self) -> [f32; 3] {
        self.home
    }

    /// The current pose in homogeneous ceiling coordinates.
    pub fn ceiltrack_pos(&self) -> [f32; 3] {
        lock(&self.pose).pos
    }

    /// Snapshot of the pose to be refined by localisation.
    pub fn pose(&self) -> PoseSlot {
        *lock(&self.pose)
    }

    /// Publish a pose refined from `from`.
    ///
    /// Returns false, leaving the pose untouched, if the car was homed since `from` was taken.
    pub fn publish_pose(&self, from: &PoseSlot, pos: [f32; 3]) -> bool {
        let mut pose = lock(&self.pose);
        if pose.homes != from.homes {
            return false
        }
        pose.pos = pos;
        true
    }

    /// Snapshot of the dynamics group.
    pub fn dynamics(&self) -> CarDynamics {
        *lock(&self.dynamics)
    }

    /// Modify the dynamics group in a single critical section.
    pub fn update_dynamics<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CarDynamics) -> R
    {
        f(&mut lock(&self.dynamics))
    }
}

impl GyroFilter {
    pub fn new(weight: f32) -> Self {
        Self {
            weight,
            smoothed: Vector3::zeros(),
            bias: Vector3::zeros(),
        }
    }

    /// Feed a raw reading, returning it with the bias removed.
    pub fn update(&mut self, raw: &Vector3<f32>) -> Vector3<f32> {
        let weight = self.weight;
        self.smoothed = self.smoothed.zip_map(raw, |p, s| maths::exp_smooth(p, s, weight));
        raw - self.bias
    }

    /// Freeze the current smoothed estimate as the bias, returning it.
    ///
    /// Only valid while the car is stationary.
    pub fn capture_bias(&mut self) -> Vector3<f32> {
        self.bias = self.smoothed;
        self.bias
    }

    pub fn smoothed(&self) -> Vector3<f32> {
        self.smoothed
    }

    pub fn bias(&self) -> Vector3<f32> {
        self.bias
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Quantise an actuation fraction to the signed 8 bit range, clamping it to `[-1, 1]` first.
pub fn quantise(fraction: f32) -> i8 {
    (ACTUATION_SCALE * maths::clamp(&fraction, &-1.0, &1.0)) as i8
}

/// Convert homogeneous ceiling coordinates into ground coordinates.
///
/// The camera looks up at the ceiling, so x, y and heading are all negated to get the top-down
/// frame, and x, y are scaled by the ceiling height into meters.
pub fn ceiling_to_ground(pos: &[f32; 3], ceil_height_m: f32) -> [f32; 3] {
    [
        -pos[0] * ceil_height_m,
        -pos[1] * ceil_height_m,
        -pos[2],
    ]
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_car_state_chunk() {
        let state = CarDynamics {
            accel: Vector3::new(0.01, -0.25, 1.0),
            gyro: Vector3::new(-0.003, 0.125, 2.5),
            throttle: -127,
            steering: 42,
            wheel_dist: 123.456,
            wheel_v: -1.5e-3,
        };

        let mut buf = vec![0u8; state.serialized_size()];
        assert_eq!(state.serialize(&mut buf), Ok(42));

        // Header and a few hand-checked payload bytes
        assert_eq!(&buf[0..4], b"CSt1");
        assert_eq!(LittleEndian::read_u32(&buf[4..8]), 42);
        assert_eq!(buf[8], 0x81);
        assert_eq!(buf[9], 42);
        assert_eq!(LittleEndian::read_f32(&buf[10..14]), 0.01);
        assert_eq!(LittleEndian::read_f32(&buf[38..42]), -1.5e-3);

        assert_eq!(CarDynamics::decode(&buf), Ok(state));
    }

    #[test]
    fn test_car_state_decode_errors() {
        let state = CarDynamics::default();
        let mut buf = vec![0u8; 50];
        state.serialize(&mut buf).unwrap();

        // Lie about the length so the payload is too long
        chunk::write_header(&mut buf, &CAR_STATE_TAG, 46).unwrap();
        assert_eq!(
            CarDynamics::decode(&buf),
            Err(ChunkError::WrongPayloadSize(CAR_STATE_TAG, 38))
        );

        assert!(matches!(
            state.serialize(&mut buf[..20]),
            Err(ChunkError::BufferTooSmall { needed: 42, available: 20 })
        ));
    }

    #[test]
    fn test_quantise() {
        assert_eq!(quantise(0.0), 0);
        assert_eq!(quantise(1.0), 127);
        assert_eq!(quantise(-1.0), -127);
        assert_eq!(quantise(0.5), 63);
        assert_eq!(quantise(-0.5), -63);
        assert_eq!(quantise(3.0), 127);
        assert_eq!(quantise(-3.0), -127);

        let mut d = CarDynamics::default();
        d.set_actuation(Actuation { throttle: 0.25, steering: -2.0 });
        assert_eq!((d.throttle, d.steering), (31, -127));
        assert_eq!(d.actuation().steering, -1.0);
    }

    #[test]
    fn test_ceiling_to_ground() {
        assert_eq!(
            ceiling_to_ground(&[-3.0, 0.5, 0.25], 2.0),
            [6.0, -1.0, -0.25]
        );
    }

    #[test]
    fn test_home() {
        let state = CarState::new([-3.03, 0.73, 0.0]);
        let before = state.pose();
        assert!(state.publish_pose(&before, [1.0, 2.0, 3.0]));
        assert_eq!(state.ceiltrack_pos(), [1.0, 2.0, 3.0]);

        // A localisation update started before homing is discarded
        let stale = state.pose();
        state.set_home();
        assert!(!state.publish_pose(&stale, [4.0, 5.0, 6.0]));
        assert_eq!(state.ceiltrack_pos(), [-3.03, 0.73, 0.0]);
        assert_eq!(state.home(), [-3.03, 0.73, 0.0]);
    }

    #[test]
    fn test_gyro_filter() {
        let mut filter = GyroFilter::new(0.5);
        let raw = Vector3::new(0.2, -0.4, 0.8);

        // No bias yet, the raw reading passes straight through
        assert_eq!(filter.update(&raw), raw);
        assert_eq!(filter.smoothed(), Vector3::new(0.1, -0.2, 0.4));

        let bias = filter.capture_bias();
        assert_eq!(bias, Vector3::new(0.1, -0.2, 0.4));
        assert_eq!(filter.update(&raw), raw - bias);
    }
}
