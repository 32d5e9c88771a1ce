//! Device implementations

pub mod mock;

use crate::config::DeviceConfig;
use crate::core::device::NavDevice;
use crate::error::{Error, Result};
use mock::MockDevice;

/// Create a device based on configuration
pub fn create_device(config: &DeviceConfig) -> Result<Box<dyn NavDevice>> {
    match config.device_type.as_str() {
        "mock" => {
            log::info!("Using simulated device");
            Ok(Box::new(MockDevice::new(&config.simulation)))
        }
        _ => Err(Error::UnknownDevice(config.device_type.clone())),
    }
}
