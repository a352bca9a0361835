//! Test utility builders for creating mock audio environments
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use std::sync::Arc;

use audio_context_manager::audio::{AudioContext, ContextManager, ManagerOptions};
use audio_context_manager::system::{DriverCall, MockAudioDriver, MockDeviceDirectory};

pub type MockManager = ContextManager<MockAudioDriver, MockDeviceDirectory>;
pub type MockContext = AudioContext<MockAudioDriver, MockDeviceDirectory>;

/// A manager wired to mocks, with handles kept for inspection
pub struct MockEnvironment {
    pub driver: MockAudioDriver,
    pub directory: MockDeviceDirectory,
    pub manager: Arc<MockManager>,
}

impl MockEnvironment {
    pub fn count_calls(&self, matches: impl Fn(&DriverCall) -> bool) -> usize {
        self.driver.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn close_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, DriverCall::CloseDevice(_)))
    }

    pub fn destroy_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, DriverCall::DestroyContext(_)))
    }

    pub fn make_current_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, DriverCall::MakeCurrent(Some(_))))
    }
}

/// Builder for creating test MockEnvironment instances
pub struct EnvironmentBuilder {
    devices: Vec<String>,
    extensions: Vec<String>,
    enumeration: bool,
    driver_available: bool,
    default_device_opens: bool,
    max_auxiliary_sends: i32,
    options: ManagerOptions,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            devices: vec!["Speakers".to_string()],
            extensions: Vec::new(),
            enumeration: true,
            driver_available: true,
            default_device_opens: true,
            max_auxiliary_sends: 2,
            options: ManagerOptions::default(),
        }
    }

    /// Replace the device list; the first device is the default
    pub fn devices(mut self, names: &[&str]) -> Self {
        self.devices = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn no_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    pub fn extension(mut self, name: &str) -> Self {
        self.extensions.push(name.to_string());
        self
    }

    pub fn without_enumeration(mut self) -> Self {
        self.enumeration = false;
        self
    }

    pub fn without_driver(mut self) -> Self {
        self.driver_available = false;
        self
    }

    /// The unnamed default device refuses to open
    pub fn default_device_fails(mut self) -> Self {
        self.default_device_opens = false;
        self
    }

    pub fn max_auxiliary_sends(mut self, sends: i32) -> Self {
        self.max_auxiliary_sends = sends;
        self
    }

    pub fn shared(mut self) -> Self {
        self.options = ManagerOptions { exclusive: false };
        self
    }

    pub fn build(self) -> MockEnvironment {
        let driver = MockAudioDriver::new();
        let directory = MockDeviceDirectory::new();

        for name in &self.devices {
            driver.add_device(name);
            directory.add_device(name);
        }
        if let Some(default) = self.devices.first() {
            driver.set_default_device_name(default);
            directory.set_default_device(Some(default));
        }
        for extension in &self.extensions {
            driver.add_extension(extension);
        }
        driver.set_default_device_available(self.default_device_opens);
        driver.set_max_auxiliary_sends(self.max_auxiliary_sends);
        directory.set_enumeration_supported(self.enumeration);
        directory.set_driver_available(self.driver_available);

        let manager =
            ContextManager::with_options(driver.clone(), directory.clone(), self.options);

        MockEnvironment {
            driver,
            directory,
            manager,
        }
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
