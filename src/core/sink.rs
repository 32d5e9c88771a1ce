//! Result sink abstraction.
//!
//! The acquisition loop hands every transformed output to a [`ResultSink`].
//! A sink also reports how many consumers are attached per [`Topic`]; the
//! loop skips the transform for topics nobody listens to.

use crate::error::Result;
use crate::gps::{GpsOdometry, NavSatFix};
use crate::transform::{PoseStamped, TransformedAttitude};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output categories published by the acquisition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "imu/data")]
    ImuData,
    #[serde(rename = "imu/pose")]
    ImuPose,
    #[serde(rename = "gps/fix")]
    GpsFix,
    #[serde(rename = "gps/odom")]
    GpsOdom,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::ImuData, Topic::ImuPose, Topic::GpsFix, Topic::GpsOdom];

    pub fn name(&self) -> &'static str {
        match self {
            Topic::ImuData => "imu/data",
            Topic::ImuPose => "imu/pose",
            Topic::GpsFix => "gps/fix",
            Topic::GpsOdom => "gps/odom",
        }
    }
}

/// A transformed output ready for publication
#[derive(Debug, Clone)]
pub enum Output {
    Imu(TransformedAttitude),
    Pose(PoseStamped),
    Fix(NavSatFix),
    Odometry(GpsOdometry),
}

impl Output {
    pub fn topic(&self) -> Topic {
        match self {
            Output::Imu(_) => Topic::ImuData,
            Output::Pose(_) => Topic::ImuPose,
            Output::Fix(_) => Topic::GpsFix,
            Output::Odometry(_) => Topic::GpsOdom,
        }
    }
}

/// Consumer of transformed outputs
pub trait ResultSink {
    /// Number of consumers currently attached to `topic`
    fn subscriber_count(&self, topic: Topic) -> usize;

    /// Deliver one output to the consumers of its topic
    fn publish(&mut self, output: Output) -> Result<()>;
}

/// In-process sink that records every published output
///
/// Consumer counts are set explicitly, which makes it the sink of choice
/// for tests and for embedding the loop in another process.
#[derive(Debug, Default)]
pub struct MemorySink {
    subscribers: HashMap<Topic, usize>,
    outputs: Vec<Output>,
}

impl MemorySink {
    /// Sink with no consumers on any topic
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink with one consumer on every topic
    pub fn subscribed_to_all() -> Self {
        let mut sink = Self::new();
        for topic in Topic::ALL {
            sink.set_subscribers(topic, 1);
        }
        sink
    }

    pub fn set_subscribers(&mut self, topic: Topic, count: usize) {
        self.subscribers.insert(topic, count);
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Number of outputs recorded on `topic`
    pub fn count(&self, topic: Topic) -> usize {
        self.outputs.iter().filter(|o| o.topic() == topic).count()
    }

    pub fn attitudes(&self) -> impl Iterator<Item = &TransformedAttitude> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Imu(a) => Some(a),
            _ => None,
        })
    }

    pub fn fixes(&self) -> impl Iterator<Item = &NavSatFix> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Fix(f) => Some(f),
            _ => None,
        })
    }

    pub fn odometry(&self) -> impl Iterator<Item = &GpsOdometry> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Odometry(odom) => Some(odom),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.outputs.clear();
    }
}

impl ResultSink for MemorySink {
    fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers.get(&topic).copied().unwrap_or(0)
    }

    fn publish(&mut self, output: Output) -> Result<()> {
        self.outputs.push(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_match_serde() {
        for topic in Topic::ALL {
            let json = serde_json::to_string(&topic).unwrap();
            assert_eq!(json, format!("\"{}\"", topic.name()));
        }
    }

    #[test]
    fn test_memory_sink_subscribers() {
        let mut sink = MemorySink::new();
        assert_eq!(sink.subscriber_count(Topic::GpsFix), 0);

        sink.set_subscribers(Topic::GpsFix, 2);
        assert_eq!(sink.subscriber_count(Topic::GpsFix), 2);
        assert_eq!(sink.subscriber_count(Topic::ImuData), 0);

        let all = MemorySink::subscribed_to_all();
        assert!(Topic::ALL.iter().all(|t| all.subscriber_count(*t) == 1));
    }
}
