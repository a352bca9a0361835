use tracing::{debug, info, warn};

use crate::error::{ContextError, Result};
use crate::system::{AudioDriver, DeviceDirectory, DeviceHandle};

/// Which step of the fallback chain produced the open device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSource {
    Requested,
    UnnamedDefault,
    NamedDefault,
}

/// A device handle together with the name it was opened under
#[derive(Debug, Clone)]
pub struct OpenedDevice {
    pub handle: DeviceHandle,
    pub name: String,
    pub source: DeviceSource,
}

/// Open a playback device, first success wins:
/// the requested name, then the unnamed default device, then the directory's
/// named default device.
pub fn open_with_fallback<D: AudioDriver, E: DeviceDirectory>(
    driver: &D,
    directory: &E,
    requested: Option<&str>,
) -> Result<OpenedDevice> {
    if let Some(name) = requested {
        debug!("Opening requested device: {}", name);
        if let Some(handle) = driver.open_device(Some(name)) {
            return Ok(OpenedDevice {
                handle,
                name: name.to_string(),
                source: DeviceSource::Requested,
            });
        }
        warn!("Could not open device '{}', falling back to default", name);
    }

    let default_name = directory.default_playback_device();

    debug!("Opening unnamed default device");
    if let Some(handle) = driver.open_device(None) {
        return Ok(OpenedDevice {
            handle,
            name: default_name.unwrap_or_else(|| "default".to_string()),
            source: DeviceSource::UnnamedDefault,
        });
    }

    if let Some(name) = default_name {
        debug!("Opening named default device: {}", name);
        if let Some(handle) = driver.open_device(Some(&name)) {
            info!("Opened default device by name: {}", name);
            return Ok(OpenedDevice {
                handle,
                name,
                source: DeviceSource::NamedDefault,
            });
        }
    }

    Err(ContextError::DeviceUnavailable {
        requested: requested.unwrap_or("default").to_string(),
    })
}
