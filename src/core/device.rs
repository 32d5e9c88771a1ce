//! NavDevice trait definition

use crate::core::types::{AttitudeSample, GpsSample};
use crate::error::Result;
use std::time::Duration;

/// Capability interface of an AHRS/GPS navigation sensor.
///
/// Command methods return `false` when the device rejects the command or
/// does not answer within the timeout; the reason is queued and can be
/// drained with [`last_error`](NavDevice::last_error).
pub trait NavDevice: Send {
    /// Open the serial link
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<()>;

    /// Close the serial link (no-op when already closed)
    fn close(&mut self);

    /// Set the timeout applied to every command round trip
    fn set_timeout(&mut self, timeout: Duration);

    fn ping(&mut self) -> bool;

    /// Halt any active stream
    fn set_idle(&mut self) -> bool;

    /// Resume streaming after idle
    fn resume(&mut self) -> bool;

    /// Query self-reported device health
    fn device_status(&mut self) -> bool;

    fn disable_all_streams(&mut self) -> bool;

    fn self_test(&mut self) -> bool;

    fn set_ahrs_format(&mut self) -> bool;

    fn set_gps_format(&mut self) -> bool;

    fn set_nav_format(&mut self) -> bool;

    /// Seed the device's fusion filter with the magnetic declination (degrees)
    fn init_kalman_filter(&mut self, declination: i32) -> bool;

    fn poll_ahrs(&mut self) -> bool;

    fn poll_gps(&mut self) -> bool;

    fn poll_nav(&mut self) -> bool;

    /// Most recently parsed AHRS sample
    fn ahrs(&self) -> AttitudeSample;

    /// Most recently parsed GPS sample
    fn gps(&self) -> GpsSample;

    /// Pop the oldest queued error message; empty string means drained
    fn last_error(&mut self) -> String;
}

impl<T: NavDevice + ?Sized> NavDevice for Box<T> {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        (**self).open(port, baud_rate)
    }
    fn close(&mut self) {
        (**self).close()
    }
    fn set_timeout(&mut self, timeout: Duration) {
        (**self).set_timeout(timeout)
    }
    fn ping(&mut self) -> bool {
        (**self).ping()
    }
    fn set_idle(&mut self) -> bool {
        (**self).set_idle()
    }
    fn resume(&mut self) -> bool {
        (**self).resume()
    }
    fn device_status(&mut self) -> bool {
        (**self).device_status()
    }
    fn disable_all_streams(&mut self) -> bool {
        (**self).disable_all_streams()
    }
    fn self_test(&mut self) -> bool {
        (**self).self_test()
    }
    fn set_ahrs_format(&mut self) -> bool {
        (**self).set_ahrs_format()
    }
    fn set_gps_format(&mut self) -> bool {
        (**self).set_gps_format()
    }
    fn set_nav_format(&mut self) -> bool {
        (**self).set_nav_format()
    }
    fn init_kalman_filter(&mut self, declination: i32) -> bool {
        (**self).init_kalman_filter(declination)
    }
    fn poll_ahrs(&mut self) -> bool {
        (**self).poll_ahrs()
    }
    fn poll_gps(&mut self) -> bool {
        (**self).poll_gps()
    }
    fn poll_nav(&mut self) -> bool {
        (**self).poll_nav()
    }
    fn ahrs(&self) -> AttitudeSample {
        (**self).ahrs()
    }
    fn gps(&self) -> GpsSample {
        (**self).gps()
    }
    fn last_error(&mut self) -> String {
        (**self).last_error()
    }
}
