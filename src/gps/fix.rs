//! Raw fix and projected odometry outputs.

use super::utm;
use crate::core::types::GpsSample;
use nalgebra::{UnitQuaternion, Vector3};

/// Fixed vertical variance of the raw fix (m²); vertical accuracy is not reported
pub const VERTICAL_PLACEHOLDER_VARIANCE: f64 = 100.0;

/// Variance that marks a pose component as unknown
pub const UNKNOWN_VARIANCE: f64 = 99999.0;

// Row-major 6×6 pose covariance indices
const COV_X: usize = 0;
const COV_Y: usize = 7;
const COV_Z: usize = 14;
const COV_ROT_X: usize = 21;
const COV_ROT_Y: usize = 28;
const COV_ROT_Z: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    NoFix,
    Fix,
}

/// Position covariance of a raw fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionCovariance {
    /// Horizontal accuracy not reported
    Unknown,
    /// Row-major 3×3, horizontal from accuracy², vertical placeholder
    Approximated([f64; 9]),
}

impl PositionCovariance {
    pub fn from_sample(sample: &GpsSample) -> Self {
        if !sample.horizontal_accuracy_valid {
            return PositionCovariance::Unknown;
        }
        let variance = sample.horizontal_accuracy * sample.horizontal_accuracy;
        let mut m = [0.0; 9];
        m[0] = variance;
        m[4] = variance;
        m[8] = VERTICAL_PLACEHOLDER_VARIANCE;
        PositionCovariance::Approximated(m)
    }
}

/// Geodetic fix as reported, with status and covariance
#[derive(Debug, Clone, PartialEq)]
pub struct NavSatFix {
    pub time_ns: u64,
    pub frame_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: FixStatus,
    pub covariance: PositionCovariance,
}

/// Fix projected onto the UTM plane
#[derive(Debug, Clone, PartialEq)]
pub struct GpsOdometry {
    pub time_ns: u64,
    pub frame_id: String,
    pub child_frame_id: String,
    /// UTM zone identifier, e.g. "33U"
    pub zone: String,
    /// x = easting, y = northing, z = 0
    pub position: Vector3<f64>,
    /// Always identity, heading is not observable from a single fix
    pub orientation: UnitQuaternion<f64>,
    /// Row-major 6×6 covariance over (x, y, z, rot x, rot y, rot z)
    pub pose_covariance: [f64; 36],
}

/// Builds fix and odometry outputs from raw GPS samples
#[derive(Debug, Clone)]
pub struct FixProjector {
    frame_id: String,
    child_frame_id: String,
}

impl FixProjector {
    pub fn new(frame_id: impl Into<String>, child_frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            child_frame_id: child_frame_id.into(),
        }
    }

    pub fn fix(&self, sample: &GpsSample) -> NavSatFix {
        NavSatFix {
            time_ns: sample.time_ns,
            frame_id: self.frame_id.clone(),
            latitude: sample.latitude,
            longitude: sample.longitude,
            status: if sample.lat_lon_valid {
                FixStatus::Fix
            } else {
                FixStatus::NoFix
            },
            covariance: PositionCovariance::from_sample(sample),
        }
    }

    pub fn odometry(&self, sample: &GpsSample) -> GpsOdometry {
        let projected = utm::project(sample.latitude, sample.longitude);

        let mut pose_covariance = [0.0; 36];
        let positional = if sample.lat_lon_valid && sample.horizontal_accuracy_valid {
            sample.horizontal_accuracy * sample.horizontal_accuracy
        } else {
            UNKNOWN_VARIANCE
        };
        pose_covariance[COV_X] = positional;
        pose_covariance[COV_Y] = positional;
        pose_covariance[COV_Z] = positional;
        pose_covariance[COV_ROT_X] = UNKNOWN_VARIANCE;
        pose_covariance[COV_ROT_Y] = UNKNOWN_VARIANCE;
        pose_covariance[COV_ROT_Z] = UNKNOWN_VARIANCE;

        GpsOdometry {
            time_ns: sample.time_ns,
            frame_id: self.frame_id.clone(),
            child_frame_id: self.child_frame_id.clone(),
            zone: projected.zone(),
            position: Vector3::new(projected.easting, projected.northing, 0.0),
            orientation: UnitQuaternion::identity(),
            pose_covariance,
        }
    }
}
