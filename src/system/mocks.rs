use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::alc;
use super::traits::{AudioDriver, ContextHandle, DeviceDirectory, DeviceHandle};
use crate::error::AlcErrorCode;

/// A native call observed by the mock driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    OpenDevice(Option<String>),
    CloseDevice(DeviceHandle),
    CreateContext(DeviceHandle, Vec<i32>),
    DestroyContext(ContextHandle),
    MakeCurrent(Option<ContextHandle>),
    Process(ContextHandle),
    Suspend(ContextHandle),
}

struct MockContext {
    device: DeviceHandle,
    attributes: Vec<i32>,
}

struct MockDriverState {
    next_handle: usize,
    openable_devices: Vec<String>,
    default_device_works: bool,
    default_device_name: String,
    open_devices: HashMap<DeviceHandle, String>,
    contexts: HashMap<ContextHandle, MockContext>,
    current: Option<ContextHandle>,
    extensions: Vec<String>,
    max_auxiliary_sends: i32,
    pending_errors: HashMap<Option<DeviceHandle>, AlcErrorCode>,
    fail_create_context: bool,
    fail_make_current: bool,
    process_error: Option<AlcErrorCode>,
    calls: Vec<DriverCall>,
    integer_queries: Vec<i32>,
    double_releases: usize,
}

impl MockDriverState {
    fn allocate(&mut self) -> usize {
        self.next_handle += 0x10;
        self.next_handle
    }

    fn set_error(&mut self, device: Option<DeviceHandle>, code: AlcErrorCode) {
        self.pending_errors.insert(device, code);
    }

    fn attribute_on_device(&self, device: DeviceHandle, attribute: i32) -> Option<i32> {
        self.contexts
            .values()
            .filter(|context| context.device == device)
            .find_map(|context| {
                context
                    .attributes
                    .chunks_exact(2)
                    .find(|pair| pair[0] == attribute)
                    .map(|pair| pair[1])
            })
    }
}

/// Mock audio driver for testing - provides controllable native behavior
#[derive(Clone)]
pub struct MockAudioDriver {
    state: Arc<Mutex<MockDriverState>>,
}

impl MockAudioDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDriverState {
                next_handle: 0x1000,
                openable_devices: Vec::new(),
                default_device_works: true,
                default_device_name: "Mock Default Device".to_string(),
                open_devices: HashMap::new(),
                contexts: HashMap::new(),
                current: None,
                extensions: vec![alc::EXT_ENUMERATION.to_string()],
                max_auxiliary_sends: 2,
                pending_errors: HashMap::new(),
                fail_create_context: false,
                fail_make_current: false,
                process_error: None,
                calls: Vec::new(),
                integer_queries: Vec::new(),
                double_releases: 0,
            })),
        }
    }

    /// Allow a named device to be opened
    pub fn add_device(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .openable_devices
            .push(name.to_string());
    }

    /// Configure whether the unnamed default device opens
    pub fn set_default_device_available(&self, available: bool) {
        self.state.lock().unwrap().default_device_works = available;
    }

    /// Name the driver reports for the unnamed default device
    pub fn set_default_device_name(&self, name: &str) {
        self.state.lock().unwrap().default_device_name = name.to_string();
    }

    pub fn add_extension(&self, name: &str) {
        self.state.lock().unwrap().extensions.push(name.to_string());
    }

    pub fn remove_extension(&self, name: &str) {
        self.state.lock().unwrap().extensions.retain(|ext| ext != name);
    }

    pub fn set_max_auxiliary_sends(&self, sends: i32) {
        self.state.lock().unwrap().max_auxiliary_sends = sends;
    }

    /// Configure the mock to refuse context creation
    pub fn set_create_context_failure(&self, should_fail: bool) {
        self.state.lock().unwrap().fail_create_context = should_fail;
    }

    /// Configure the mock to refuse make-current calls for non-null contexts
    pub fn set_make_current_failure(&self, should_fail: bool) {
        self.state.lock().unwrap().fail_make_current = should_fail;
    }

    /// Error recorded on the device after each process/suspend call
    pub fn set_process_error(&self, code: Option<AlcErrorCode>) {
        self.state.lock().unwrap().process_error = code;
    }

    /// Record a pending error on a device (or globally for `None`)
    pub fn inject_error(&self, device: Option<DeviceHandle>, code: AlcErrorCode) {
        self.state.lock().unwrap().set_error(device, code);
    }

    /// Get all native calls that were made
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Attribute lists passed to every create-context call, in order
    pub fn created_attributes(&self) -> Vec<Vec<i32>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::CreateContext(_, attributes) => Some(attributes),
                _ => None,
            })
            .collect()
    }

    /// Names passed to every open-device call, in order
    pub fn open_attempts(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::OpenDevice(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Parameters passed to every integer query, in order
    pub fn integer_queries(&self) -> Vec<i32> {
        self.state.lock().unwrap().integer_queries.clone()
    }

    pub fn open_device_count(&self) -> usize {
        self.state.lock().unwrap().open_devices.len()
    }

    pub fn live_context_count(&self) -> usize {
        self.state.lock().unwrap().contexts.len()
    }

    /// Close/destroy calls on handles that were already released
    pub fn double_release_count(&self) -> usize {
        self.state.lock().unwrap().double_releases
    }

    pub fn current(&self) -> Option<ContextHandle> {
        self.state.lock().unwrap().current
    }
}

impl AudioDriver for MockAudioDriver {
    fn open_device(&self, name: Option<&str>) -> Option<DeviceHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::OpenDevice(name.map(str::to_string)));

        let bound_name = match name {
            Some(name) if state.openable_devices.iter().any(|d| d == name) => name.to_string(),
            Some(_) => return None,
            None if state.default_device_works => state.default_device_name.clone(),
            None => return None,
        };

        let handle = DeviceHandle::from_raw(state.allocate())?;
        state.open_devices.insert(handle, bound_name);
        Some(handle)
    }

    fn close_device(&self, device: DeviceHandle) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::CloseDevice(device));
        if state.open_devices.remove(&device).is_some() {
            true
        } else {
            state.double_releases += 1;
            state.set_error(Some(device), AlcErrorCode::InvalidDevice);
            false
        }
    }

    fn create_context(&self, device: DeviceHandle, attributes: &[i32]) -> Option<ContextHandle> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(DriverCall::CreateContext(device, attributes.to_vec()));

        if !state.open_devices.contains_key(&device) {
            state.set_error(Some(device), AlcErrorCode::InvalidDevice);
            return None;
        }
        if state.fail_create_context {
            state.set_error(Some(device), AlcErrorCode::InvalidValue);
            return None;
        }

        let handle = ContextHandle::from_raw(state.allocate())?;
        state.contexts.insert(
            handle,
            MockContext {
                device,
                attributes: attributes.to_vec(),
            },
        );
        Some(handle)
    }

    fn destroy_context(&self, context: ContextHandle) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::DestroyContext(context));
        if state.contexts.remove(&context).is_none() {
            state.double_releases += 1;
            state.set_error(None, AlcErrorCode::InvalidContext);
        }
        if state.current == Some(context) {
            state.current = None;
        }
    }

    fn make_context_current(&self, context: Option<ContextHandle>) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::MakeCurrent(context));

        let Some(context) = context else {
            state.current = None;
            return true;
        };

        let device = state.contexts.get(&context).map(|c| c.device);
        if state.fail_make_current || device.is_none() {
            state.set_error(device, AlcErrorCode::InvalidContext);
            return false;
        }

        state.current = Some(context);
        true
    }

    fn current_context(&self) -> Option<ContextHandle> {
        self.state.lock().unwrap().current
    }

    fn process_context(&self, context: ContextHandle) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::Process(context));
        if let (Some(code), Some(device)) = (
            state.process_error,
            state.contexts.get(&context).map(|c| c.device),
        ) {
            state.set_error(Some(device), code);
        }
    }

    fn suspend_context(&self, context: ContextHandle) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::Suspend(context));
        if let (Some(code), Some(device)) = (
            state.process_error,
            state.contexts.get(&context).map(|c| c.device),
        ) {
            state.set_error(Some(device), code);
        }
    }

    fn is_extension_present(&self, _device: Option<DeviceHandle>, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(name))
    }

    fn get_integer(&self, device: Option<DeviceHandle>, param: i32, count: usize) -> Vec<i32> {
        let mut state = self.state.lock().unwrap();
        state.integer_queries.push(param);
        let value = match (param, device) {
            (alc::ALC_MAX_AUXILIARY_SENDS, _) => state.max_auxiliary_sends,
            (alc::ALC_MONO_SOURCES, Some(device)) => state
                .attribute_on_device(device, alc::ALC_MONO_SOURCES)
                .unwrap_or(255),
            (alc::ALC_STEREO_SOURCES, Some(device)) => state
                .attribute_on_device(device, alc::ALC_STEREO_SOURCES)
                .unwrap_or(1),
            (alc::ALC_MAJOR_VERSION, _) => 1,
            (alc::ALC_MINOR_VERSION, _) => 1,
            _ => 0,
        };
        let mut values = vec![0; count];
        if let Some(first) = values.first_mut() {
            *first = value;
        }
        values
    }

    fn get_string(&self, device: Option<DeviceHandle>, param: i32) -> Option<String> {
        let state = self.state.lock().unwrap();
        match (param, device) {
            (alc::ALC_DEVICE_SPECIFIER, Some(device)) => state.open_devices.get(&device).cloned(),
            (alc::ALC_DEFAULT_DEVICE_SPECIFIER | alc::ALC_DEFAULT_ALL_DEVICES_SPECIFIER, None) => {
                Some(state.default_device_name.clone())
            }
            (alc::ALC_EXTENSIONS, _) => Some(state.extensions.join(" ")),
            _ => None,
        }
    }

    fn get_string_list(&self, device: Option<DeviceHandle>, param: i32) -> Vec<String> {
        let state = self.state.lock().unwrap();
        match (param, device) {
            (alc::ALC_DEVICE_SPECIFIER | alc::ALC_ALL_DEVICES_SPECIFIER, None) => {
                state.openable_devices.clone()
            }
            _ => Vec::new(),
        }
    }

    fn last_error(&self, device: Option<DeviceHandle>) -> AlcErrorCode {
        self.state
            .lock()
            .unwrap()
            .pending_errors
            .remove(&device)
            .unwrap_or(AlcErrorCode::NoError)
    }
}

impl Default for MockAudioDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock device directory for testing - provides a controllable device list
#[derive(Clone)]
pub struct MockDeviceDirectory {
    pub driver_available: Arc<Mutex<bool>>,
    pub devices: Arc<Mutex<Vec<String>>>,
    pub default_device: Arc<Mutex<Option<String>>>,
    pub enumeration_supported: Arc<Mutex<bool>>,
}

impl MockDeviceDirectory {
    pub fn new() -> Self {
        Self {
            driver_available: Arc::new(Mutex::new(true)),
            devices: Arc::new(Mutex::new(Vec::new())),
            default_device: Arc::new(Mutex::new(None)),
            enumeration_supported: Arc::new(Mutex::new(true)),
        }
    }

    /// Directory listing the given devices, the first one being the default
    pub fn with_devices(names: &[&str]) -> Self {
        let directory = Self::new();
        for name in names {
            directory.add_device(name);
        }
        directory.set_default_device(names.first().copied());
        directory
    }

    pub fn add_device(&self, name: &str) {
        self.devices.lock().unwrap().push(name.to_string());
    }

    pub fn clear_devices(&self) {
        self.devices.lock().unwrap().clear();
    }

    pub fn set_default_device(&self, name: Option<&str>) {
        *self.default_device.lock().unwrap() = name.map(str::to_string);
    }

    pub fn set_driver_available(&self, available: bool) {
        *self.driver_available.lock().unwrap() = available;
    }

    pub fn set_enumeration_supported(&self, supported: bool) {
        *self.enumeration_supported.lock().unwrap() = supported;
    }
}

impl DeviceDirectory for MockDeviceDirectory {
    fn is_driver_available(&self) -> bool {
        *self.driver_available.lock().unwrap()
    }

    fn playback_devices(&self) -> Vec<String> {
        self.devices.lock().unwrap().clone()
    }

    fn default_playback_device(&self) -> Option<String> {
        self.default_device.lock().unwrap().clone()
    }

    fn supports_enumeration(&self) -> bool {
        *self.enumeration_supported.lock().unwrap()
    }
}

impl Default for MockDeviceDirectory {
    fn default() -> Self {
        Self::new()
    }
}
