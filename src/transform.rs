//! Device-frame to navigation-frame conversion of AHRS samples.
//!
//! ## Axis convention
//!
//! The device reports acceleration and angular rate with X and Z pointing
//! opposite to the navigation frame. Both vectors are converted by negating
//! X and Z and keeping Y.
//!
//! ## Orientation
//!
//! Yaw is offset by half a turn and wrapped into (−π, π], then negated.
//! Roll and pitch follow the configured [`OrientationConvention`]:
//!
//! | Convention | roll | pitch | yaw |
//! |------------|------|-------|-----|
//! | `DeviceCoupled` (default) | −pitch | pitch | −wrap(yaw + π) |
//! | `Independent` | −roll | pitch | −wrap(yaw + π) |
//!
//! `DeviceCoupled` reuses the raw pitch for both roll and pitch and ignores
//! the raw roll. Deployed consumers are calibrated against that output, so it
//! stays the default until the device's reporting convention is confirmed.
//!
//! ## Covariance
//!
//! The three covariance matrices are fixed for the process lifetime:
//! `stdev²` on the diagonal (row-major indices 0, 4, 8), zero elsewhere.

use crate::config::NoiseConfig;
use crate::core::types::AttitudeSample;
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use std::f32::consts::PI;

/// How the raw roll/pitch pair maps onto the output orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationConvention {
    /// roll = −pitch, pitch = pitch (raw roll unused)
    #[default]
    DeviceCoupled,
    /// roll = −roll, pitch = pitch
    Independent,
}

/// Offset yaw by π and wrap into (−π, π]
#[inline]
pub fn wrap_yaw(yaw: f32) -> f32 {
    let mut wrapped = yaw + PI;
    if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// Row-major 3×3 matrix with `value` on the diagonal
#[inline]
pub fn diagonal3(value: f64) -> [f64; 9] {
    let mut m = [0.0; 9];
    m[0] = value;
    m[4] = value;
    m[8] = value;
    m
}

/// Fixed attitude covariances derived once from configured standard deviations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovarianceModel {
    pub linear_acceleration: [f64; 9],
    pub angular_velocity: [f64; 9],
    pub orientation: [f64; 9],
}

impl CovarianceModel {
    pub fn from_stdevs(
        linear_acceleration_stdev: f64,
        orientation_stdev: f64,
        angular_velocity_stdev: f64,
    ) -> Self {
        Self {
            linear_acceleration: diagonal3(linear_acceleration_stdev * linear_acceleration_stdev),
            angular_velocity: diagonal3(angular_velocity_stdev * angular_velocity_stdev),
            orientation: diagonal3(orientation_stdev * orientation_stdev),
        }
    }

    pub fn from_config(noise: &NoiseConfig) -> Self {
        Self::from_stdevs(
            noise.linear_acceleration_stdev,
            noise.orientation_stdev,
            noise.angular_velocity_stdev,
        )
    }
}

/// Navigation-frame attitude with fixed covariances
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedAttitude {
    pub time_ns: u64,
    pub frame_id: String,
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub linear_acceleration: Vector3<f64>,
    pub orientation_covariance: [f64; 9],
    pub angular_velocity_covariance: [f64; 9],
    pub linear_acceleration_covariance: [f64; 9],
}

/// Orientation-only pose anchored at the frame origin
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStamped {
    pub time_ns: u64,
    pub frame_id: String,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

/// Converts raw AHRS samples using a fixed convention and covariance model
#[derive(Debug, Clone)]
pub struct AttitudeTransform {
    convention: OrientationConvention,
    covariance: CovarianceModel,
    frame_id: String,
}

impl AttitudeTransform {
    pub fn new(
        convention: OrientationConvention,
        covariance: CovarianceModel,
        frame_id: impl Into<String>,
    ) -> Self {
        Self {
            convention,
            covariance,
            frame_id: frame_id.into(),
        }
    }

    pub fn convention(&self) -> OrientationConvention {
        self.convention
    }

    pub fn covariance(&self) -> &CovarianceModel {
        &self.covariance
    }

    /// Output orientation for a raw sample
    pub fn orientation(&self, sample: &AttitudeSample) -> UnitQuaternion<f64> {
        let yaw = wrap_yaw(sample.yaw);
        let roll = match self.convention {
            OrientationConvention::DeviceCoupled => -sample.pitch,
            OrientationConvention::Independent => -sample.roll,
        };
        UnitQuaternion::from_euler_angles(roll as f64, sample.pitch as f64, -yaw as f64)
    }

    pub fn attitude(&self, sample: &AttitudeSample) -> TransformedAttitude {
        TransformedAttitude {
            time_ns: sample.time_ns,
            frame_id: self.frame_id.clone(),
            orientation: self.orientation(sample),
            angular_velocity: flip_xz(&sample.gyro),
            linear_acceleration: flip_xz(&sample.accel),
            orientation_covariance: self.covariance.orientation,
            angular_velocity_covariance: self.covariance.angular_velocity,
            linear_acceleration_covariance: self.covariance.linear_acceleration,
        }
    }

    pub fn pose(&self, sample: &AttitudeSample) -> PoseStamped {
        PoseStamped {
            time_ns: sample.time_ns,
            frame_id: self.frame_id.clone(),
            position: Vector3::zeros(),
            orientation: self.orientation(sample),
        }
    }
}

/// Device frame to navigation frame: negate X and Z, keep Y
#[inline]
fn flip_xz(v: &[f32; 3]) -> Vector3<f64> {
    Vector3::new(-(v[0] as f64), v[1] as f64, -(v[2] as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI as PI64;

    fn transform(convention: OrientationConvention) -> AttitudeTransform {
        AttitudeTransform::new(
            convention,
            CovarianceModel::from_stdevs(0.098, 0.035, 0.012),
            "/imu",
        )
    }

    #[test]
    fn test_covariance_is_stdev_squared_on_diagonal() {
        for s in [0.0, 0.012, 0.035, 0.098, 1.5] {
            let model = CovarianceModel::from_stdevs(s, s, s);
            for m in [model.linear_acceleration, model.angular_velocity, model.orientation] {
                for (i, v) in m.iter().enumerate() {
                    if i == 0 || i == 4 || i == 8 {
                        assert_eq!(*v, s * s);
                    } else {
                        assert_eq!(*v, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_covariance_identical_across_samples() {
        let t = transform(OrientationConvention::DeviceCoupled);
        let a = t.attitude(&AttitudeSample {
            yaw: 0.1,
            time_ns: 1,
            ..Default::default()
        });
        let b = t.attitude(&AttitudeSample {
            yaw: -2.0,
            pitch: 0.4,
            time_ns: 2,
            ..Default::default()
        });
        assert_eq!(a.orientation_covariance, b.orientation_covariance);
        assert_eq!(a.angular_velocity_covariance, b.angular_velocity_covariance);
        assert_eq!(a.linear_acceleration_covariance, b.linear_acceleration_covariance);
        assert_relative_eq!(a.linear_acceleration_covariance[0], 0.098 * 0.098);
    }

    #[test]
    fn test_wrap_yaw_range() {
        let steps = 2000;
        for i in 0..=steps {
            let y = -PI + 2.0 * PI * (i as f32 / steps as f32);
            let y = y.clamp(-PI, PI);
            let w = wrap_yaw(y);
            assert!(w > -PI && w <= PI, "wrap_yaw({}) = {} out of range", y, w);

            // Same angle as y + π modulo 2π
            let diff = (w as f64 - (y as f64 + PI64)).rem_euclid(2.0 * PI64);
            assert!(diff < 1e-5 || (2.0 * PI64 - diff) < 1e-5);
        }
    }

    #[test]
    fn test_wrap_yaw_examples() {
        assert_relative_eq!(wrap_yaw(0.0), PI);
        assert_relative_eq!(wrap_yaw(-PI), 0.0);
        assert_relative_eq!(wrap_yaw(PI), 0.0);
        assert_relative_eq!(wrap_yaw(PI / 2.0), -PI / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_axis_flip() {
        let t = transform(OrientationConvention::DeviceCoupled);
        let out = t.attitude(&AttitudeSample {
            accel: [1.0, 2.0, 9.81],
            gyro: [0.1, -0.2, 0.3],
            ..Default::default()
        });
        assert_relative_eq!(out.linear_acceleration.x, -1.0);
        assert_relative_eq!(out.linear_acceleration.y, 2.0);
        assert_relative_eq!(out.linear_acceleration.z, -9.81, epsilon = 1e-6);
        assert_relative_eq!(out.angular_velocity.x, -0.1, epsilon = 1e-7);
        assert_relative_eq!(out.angular_velocity.y, -0.2, epsilon = 1e-7);
        assert_relative_eq!(out.angular_velocity.z, -0.3, epsilon = 1e-7);
    }

    #[test]
    fn test_device_coupled_orientation_regression() {
        // Pinned output of the default convention. A change here must be a
        // reviewed change to the orientation convention.
        let t = transform(OrientationConvention::DeviceCoupled);
        let sample = AttitudeSample {
            roll: -0.2,
            pitch: 0.3,
            yaw: 0.5,
            ..Default::default()
        };
        let q = t.orientation(&sample);
        assert_relative_eq!(q.i, -0.179_723_036_400_129_2, epsilon = 1e-6);
        assert_relative_eq!(q.j, -0.106_610_176_930_862_06, epsilon = 1e-6);
        assert_relative_eq!(q.k, 0.952_799_879_537_374_7, epsilon = 1e-6);
        assert_relative_eq!(q.w, 0.220_241_435_509_879_8, epsilon = 1e-6);

        // Raw roll is ignored
        let other_roll = AttitudeSample { roll: 1.0, ..sample };
        assert_eq!(t.orientation(&other_roll), q);
    }

    #[test]
    fn test_independent_orientation_uses_roll() {
        let t = transform(OrientationConvention::Independent);
        let sample = AttitudeSample {
            roll: -0.2,
            pitch: 0.3,
            yaw: 0.5,
            ..Default::default()
        };
        let q = t.orientation(&sample);
        assert_relative_eq!(q.i, -0.119_647_277_377_397_47, epsilon = 1e-6);
        assert_relative_eq!(q.j, 0.132_430_544_940_436_27, epsilon = 1e-6);
        assert_relative_eq!(q.k, 0.949_555_417_571_004_4, epsilon = 1e-6);
        assert_relative_eq!(q.w, 0.257_858_854_306_984_85, epsilon = 1e-6);
    }

    #[test]
    fn test_pose_at_origin() {
        let t = transform(OrientationConvention::DeviceCoupled);
        let sample = AttitudeSample {
            pitch: 0.1,
            yaw: 1.0,
            time_ns: 42,
            ..Default::default()
        };
        let pose = t.pose(&sample);
        assert_eq!(pose.position, Vector3::zeros());
        assert_eq!(pose.time_ns, 42);
        assert_eq!(pose.frame_id, "/imu");
        assert_eq!(pose.orientation, t.orientation(&sample));
    }
}
