//! # Velocity estimator
//!
//! Fuses the wheel encoders and the IMU into a single forward velocity estimate. When the car
//! reports wheel motion it is used as is. Otherwise the previous estimate is decayed and
//! corrected by the lateral acceleration, and while turning a small fraction of the velocity
//! implied by centripetal motion (`a = v * omega`) is blended in.
//!
//! The fallback is a heuristic and is not a calibrated filter.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use car_if::eqpt::car::WheelMotion;
use crate::car_state::CarDynamics;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How the yaw rate is compared to the threshold before blending in the centripetal term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum YawGuard {
    /// Blend only while the yaw rate is above the threshold, so only when turning in the
    /// positive direction.
    Literal,

    /// Blend while the magnitude of the yaw rate is above the threshold.
    Magnitude,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the velocity estimator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VelEstParams {
    /// Weight given to the previous estimate in the fallback
    pub decay: f32,

    /// Gravitational acceleration used to convert the accelerometer reading from g
    ///
    /// Units: meters/second^2
    pub gravity: f32,

    /// Yaw rate above which the centripetal term is blended in
    ///
    /// Units: radians/second
    pub yaw_rate_threshold: f32,

    /// Weight of the centripetal term
    pub centripetal_weight: f32,

    pub yaw_guard: YawGuard,
}

/// The velocity estimator.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    params: VelEstParams
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for YawGuard {
    fn default() -> Self {
        YawGuard::Literal
    }
}

impl Default for VelEstParams {
    fn default() -> Self {
        Self {
            decay: 0.95,
            gravity: 9.8,
            yaw_rate_threshold: 0.1,
            centripetal_weight: 0.05,
            yaw_guard: YawGuard::default(),
        }
    }
}

impl YawGuard {
    /// Whether the centripetal term should be blended in for this yaw rate.
    pub fn passes(self, yaw_rate: f32, threshold: f32) -> bool {
        match self {
            YawGuard::Literal => yaw_rate > threshold,
            YawGuard::Magnitude => yaw_rate.abs() > threshold,
        }
    }
}

impl VelocityEstimator {
    pub fn new(params: VelEstParams) -> Self {
        Self {
            params
        }
    }

    pub fn params(&self) -> &VelEstParams {
        &self.params
    }

    /// Update `wheel_v` (and `wheel_dist`) in `dynamics`.
    ///
    /// `dynamics.accel` and `dynamics.gyro` must already hold this tick's IMU readings, with
    /// the gyro bias removed.
    pub fn update(&self, dynamics: &mut CarDynamics, wheel: Option<WheelMotion>, dt: f32) {
        if let Some(motion) = wheel {
            dynamics.wheel_v = motion.v;
            dynamics.wheel_dist += motion.ds;
            return
        }

        let p = &self.params;
        let accel = &dynamics.accel;
        let yaw_rate = dynamics.gyro[2];

        let mut v = p.decay * (dynamics.wheel_v - p.gravity * accel[1] * dt);

        if p.yaw_guard.passes(yaw_rate, p.yaw_rate_threshold) {
            v += p.centripetal_weight * (accel[0] / yaw_rate).abs();
        }

        dynamics.wheel_v = v;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
