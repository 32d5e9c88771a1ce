//! GPS fix tracking and projection.
//!
//! - [`tracker`]: fix acquired/lost edges and the periodic accuracy summary
//! - [`fix`]: raw fix and UTM odometry outputs with derived covariance
//! - [`utm`]: WGS-84 to UTM projection

pub mod fix;
pub mod tracker;
pub mod utm;

pub use fix::{
    FixProjector, FixStatus, GpsOdometry, NavSatFix, PositionCovariance, UNKNOWN_VARIANCE,
    VERTICAL_PLACEHOLDER_VARIANCE,
};
pub use tracker::{FixEdge, FixTracker, SummaryCounter, SummaryLine, SummaryReport};
