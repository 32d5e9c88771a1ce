//! Message types published over UDP.
//!
//! Wire records are plain arrays and scalars so both JSON and Postcard
//! clients can decode them without linear algebra types. Quaternions are
//! `[x, y, z, w]`, 3×3 and 6×6 covariances are row-major.

use crate::core::sink::Output;
use crate::gps::{FixStatus, GpsOdometry, NavSatFix, PositionCovariance};
use crate::transform::{PoseStamped, TransformedAttitude};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// One published output, tagged with its topic name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub topic: String,
    pub payload: Payload,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Payload {
    Imu(ImuMessage),
    Pose(PoseMessage),
    Fix(FixMessage),
    Odometry(OdometryMessage),
}

/// Attitude, angular velocity and acceleration in the navigation frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImuMessage {
    pub time_ns: u64,
    pub frame_id: String,
    pub orientation: [f64; 4],
    pub orientation_covariance: [f64; 9],
    pub angular_velocity: [f64; 3],
    pub angular_velocity_covariance: [f64; 9],
    pub linear_acceleration: [f64; 3],
    pub linear_acceleration_covariance: [f64; 9],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoseMessage {
    pub time_ns: u64,
    pub frame_id: String,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FixMessage {
    pub time_ns: u64,
    pub frame_id: String,
    pub has_fix: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when horizontal accuracy is not reported
    pub position_covariance: Option<[f64; 9]>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OdometryMessage {
    pub time_ns: u64,
    pub frame_id: String,
    pub child_frame_id: String,
    pub zone: String,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    /// 36 entries, row-major
    pub pose_covariance: Vec<f64>,
}

fn quat(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.i, q.j, q.k, q.w]
}

fn vec3(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

impl From<&TransformedAttitude> for ImuMessage {
    fn from(a: &TransformedAttitude) -> Self {
        Self {
            time_ns: a.time_ns,
            frame_id: a.frame_id.clone(),
            orientation: quat(&a.orientation),
            orientation_covariance: a.orientation_covariance,
            angular_velocity: vec3(&a.angular_velocity),
            angular_velocity_covariance: a.angular_velocity_covariance,
            linear_acceleration: vec3(&a.linear_acceleration),
            linear_acceleration_covariance: a.linear_acceleration_covariance,
        }
    }
}

impl From<&PoseStamped> for PoseMessage {
    fn from(p: &PoseStamped) -> Self {
        Self {
            time_ns: p.time_ns,
            frame_id: p.frame_id.clone(),
            position: vec3(&p.position),
            orientation: quat(&p.orientation),
        }
    }
}

impl From<&NavSatFix> for FixMessage {
    fn from(f: &NavSatFix) -> Self {
        Self {
            time_ns: f.time_ns,
            frame_id: f.frame_id.clone(),
            has_fix: f.status == FixStatus::Fix,
            latitude: f.latitude,
            longitude: f.longitude,
            position_covariance: match f.covariance {
                PositionCovariance::Unknown => None,
                PositionCovariance::Approximated(m) => Some(m),
            },
        }
    }
}

impl From<&GpsOdometry> for OdometryMessage {
    fn from(o: &GpsOdometry) -> Self {
        Self {
            time_ns: o.time_ns,
            frame_id: o.frame_id.clone(),
            child_frame_id: o.child_frame_id.clone(),
            zone: o.zone.clone(),
            position: vec3(&o.position),
            orientation: quat(&o.orientation),
            pose_covariance: o.pose_covariance.to_vec(),
        }
    }
}

impl From<&Output> for Message {
    fn from(output: &Output) -> Self {
        let payload = match output {
            Output::Imu(a) => Payload::Imu(a.into()),
            Output::Pose(p) => Payload::Pose(p.into()),
            Output::Fix(f) => Payload::Fix(f.into()),
            Output::Odometry(o) => Payload::Odometry(o.into()),
        };
        Self {
            topic: output.topic().name().to_string(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GpsSample;
    use crate::gps::FixProjector;
    use crate::streaming::wire::{Serializer, WireFormat};

    fn sample() -> GpsSample {
        GpsSample {
            latitude: 48.8584,
            longitude: 2.2945,
            lat_lon_valid: true,
            horizontal_accuracy: 2.0,
            horizontal_accuracy_valid: true,
            time_ns: 11,
        }
    }

    #[test]
    fn test_fix_message() {
        let fix = FixProjector::new("/imu", "/base_footprint").fix(&sample());
        let msg = Message::from(&Output::Fix(fix));

        assert_eq!(msg.topic, "gps/fix");
        let Payload::Fix(f) = msg.payload else {
            panic!("expected fix payload");
        };
        assert!(f.has_fix);
        assert_eq!(f.position_covariance.map(|m| m[0]), Some(4.0));
    }

    #[test]
    fn test_odometry_message_through_postcard() {
        let odom = FixProjector::new("/imu", "/base_footprint").odometry(&sample());
        let msg = Message::from(&Output::Odometry(odom));

        let serializer = Serializer::new(WireFormat::Postcard);
        let bytes = serializer.serialize(&msg).unwrap();
        let decoded: Message = serializer.deserialize(&bytes).unwrap();

        let Payload::Odometry(o) = &decoded.payload else {
            panic!("expected odometry payload");
        };
        assert_eq!(o.pose_covariance.len(), 36);
        assert_eq!(o.orientation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(o.zone, "31U");
        assert_eq!(decoded, msg);
    }
}
