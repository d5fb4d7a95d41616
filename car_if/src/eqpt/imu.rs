//! # IMU Interface

use nalgebra::Vector3;

/// One reading from the inertial measurement unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Acceleration in the car body frame, in units of g.
    pub accel: Vector3<f32>,

    /// Raw angular rate in the car body frame.
    ///
    /// Units: radians/second
    pub gyro: Vector3<f32>,
}

/// An inertial measurement unit.
///
/// Reads are assumed to always succeed.
pub trait Imu: Send {
    fn read_imu(&mut self) -> ImuSample;
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            accel: Vector3::zeros(),
            gyro: Vector3::zeros()
        }
    }
}
