//! DishaIO - lifecycle control and fixed-rate acquisition for AHRS/GPS sensors
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌──────────────────┐   ┌────────────┐
//! │ NavDevice  │◀──│ DeviceSession │◀──│ AcquisitionLoop  │──▶│ ResultSink │
//! │ (mock/...) │   │ (lifecycle)   │   │ transform + gps  │   │ (UDP/mem)  │
//! └────────────┘   └───────────────┘   └────────▲─────────┘   └────────────┘
//!                                               │ admin channel
//!                                        ┌──────┴──────┐
//!                                        │ AdminServer │
//!                                        └─────────────┘
//! ```
//!
//! A [`DeviceSession`] brings the device to streaming; only then may the
//! [`AcquisitionLoop`] start. Each tick polls the device, converts samples
//! into the navigation frame, tracks GPS fix quality and hands outputs to a
//! [`ResultSink`](core::sink::ResultSink).

pub mod acquisition;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod gps;
pub mod lifecycle;
pub mod streaming;
pub mod transform;

pub use acquisition::{AcquisitionLoop, LoopStats, TickReport};
pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{DeviceMode, DeviceSession, LifecycleState, ResetOutcome};
