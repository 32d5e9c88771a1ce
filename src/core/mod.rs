//! Core abstractions shared by the lifecycle controller and acquisition loop.
//!
//! - [`device::NavDevice`]: Capability interface to implement for new hardware
//! - [`sink::ResultSink`]: Where transformed outputs go
//! - [`admin`]: Requests serviced between ticks
//! - [`types`]: Raw device samples

pub mod admin;
pub mod device;
pub mod sink;
pub mod types;
