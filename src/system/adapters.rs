use libc::{c_char, c_int, c_void};
use libloading::Library;
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;
use tracing::{debug, info};

use super::alc;
use super::traits::{AudioDriver, ContextHandle, DeviceDirectory, DeviceHandle};
use crate::error::{AlcErrorCode, ContextError};

type AlcOpenDevice = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type AlcCloseDevice = unsafe extern "C" fn(*mut c_void) -> c_char;
type AlcCreateContext = unsafe extern "C" fn(*mut c_void, *const c_int) -> *mut c_void;
type AlcContextCall = unsafe extern "C" fn(*mut c_void);
type AlcMakeContextCurrent = unsafe extern "C" fn(*mut c_void) -> c_char;
type AlcGetCurrentContext = unsafe extern "C" fn() -> *mut c_void;
type AlcIsExtensionPresent = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_char;
type AlcGetIntegerv = unsafe extern "C" fn(*mut c_void, c_int, c_int, *mut c_int);
type AlcGetString = unsafe extern "C" fn(*mut c_void, c_int) -> *const c_char;
type AlcGetError = unsafe extern "C" fn(*mut c_void) -> c_int;

#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["soft_oal.dll", "OpenAL32.dll"];

#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &[
    "libopenal.1.dylib",
    "libopenal.dylib",
    "/System/Library/Frameworks/OpenAL.framework/OpenAL",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &["libopenal.so.1", "libopenal.so"];

/// Resolved ALC entry points
struct AlcFunctions {
    open_device: AlcOpenDevice,
    close_device: AlcCloseDevice,
    create_context: AlcCreateContext,
    destroy_context: AlcContextCall,
    make_context_current: AlcMakeContextCurrent,
    get_current_context: AlcGetCurrentContext,
    process_context: AlcContextCall,
    suspend_context: AlcContextCall,
    is_extension_present: AlcIsExtensionPresent,
    get_integerv: AlcGetIntegerv,
    get_string: AlcGetString,
    get_error: AlcGetError,
}

/// Production implementation of AudioDriver backed by the host's OpenAL library
pub struct OpenAlDriver {
    library_name: String,
    functions: AlcFunctions,
    // Keeps the resolved function pointers valid; dropped last
    _library: Library,
}

impl OpenAlDriver {
    /// Load the first OpenAL library found on the host
    pub fn load() -> Result<Self, ContextError> {
        let mut failures = Vec::new();
        for name in LIBRARY_NAMES {
            match Self::load_from(name) {
                Ok(driver) => return Ok(driver),
                Err(e) => {
                    debug!("Could not load {}: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }
        Err(ContextError::DriverAbsent(failures.join("; ")))
    }

    /// Load OpenAL from a specific library name or path
    pub fn load_from(name: &str) -> Result<Self, libloading::Error> {
        let library = unsafe { Library::new(name) }?;
        let functions = unsafe {
            AlcFunctions {
                open_device: *library.get::<AlcOpenDevice>(b"alcOpenDevice\0")?,
                close_device: *library.get::<AlcCloseDevice>(b"alcCloseDevice\0")?,
                create_context: *library.get::<AlcCreateContext>(b"alcCreateContext\0")?,
                destroy_context: *library.get::<AlcContextCall>(b"alcDestroyContext\0")?,
                make_context_current: *library
                    .get::<AlcMakeContextCurrent>(b"alcMakeContextCurrent\0")?,
                get_current_context: *library
                    .get::<AlcGetCurrentContext>(b"alcGetCurrentContext\0")?,
                process_context: *library.get::<AlcContextCall>(b"alcProcessContext\0")?,
                suspend_context: *library.get::<AlcContextCall>(b"alcSuspendContext\0")?,
                is_extension_present: *library
                    .get::<AlcIsExtensionPresent>(b"alcIsExtensionPresent\0")?,
                get_integerv: *library.get::<AlcGetIntegerv>(b"alcGetIntegerv\0")?,
                get_string: *library.get::<AlcGetString>(b"alcGetString\0")?,
                get_error: *library.get::<AlcGetError>(b"alcGetError\0")?,
            }
        };

        info!("Loaded OpenAL from {}", name);
        Ok(Self {
            library_name: name.to_string(),
            functions,
            _library: library,
        })
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    fn raw_device(device: Option<DeviceHandle>) -> *mut c_void {
        device.map_or(ptr::null_mut(), |handle| handle.as_raw() as *mut c_void)
    }

    fn raw_context(context: Option<ContextHandle>) -> *mut c_void {
        context.map_or(ptr::null_mut(), |handle| handle.as_raw() as *mut c_void)
    }
}

impl fmt::Debug for OpenAlDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAlDriver")
            .field("library_name", &self.library_name)
            .finish()
    }
}

impl AudioDriver for OpenAlDriver {
    fn open_device(&self, name: Option<&str>) -> Option<DeviceHandle> {
        let name = match name {
            Some(name) => Some(CString::new(name).ok()?),
            None => None,
        };
        let raw = unsafe {
            (self.functions.open_device)(name.as_ref().map_or(ptr::null(), |n| n.as_ptr()))
        };
        DeviceHandle::from_raw(raw as usize)
    }

    fn close_device(&self, device: DeviceHandle) -> bool {
        unsafe { (self.functions.close_device)(Self::raw_device(Some(device))) != 0 }
    }

    fn create_context(&self, device: DeviceHandle, attributes: &[i32]) -> Option<ContextHandle> {
        let raw = unsafe {
            (self.functions.create_context)(Self::raw_device(Some(device)), attributes.as_ptr())
        };
        ContextHandle::from_raw(raw as usize)
    }

    fn destroy_context(&self, context: ContextHandle) {
        unsafe { (self.functions.destroy_context)(Self::raw_context(Some(context))) }
    }

    fn make_context_current(&self, context: Option<ContextHandle>) -> bool {
        unsafe { (self.functions.make_context_current)(Self::raw_context(context)) != 0 }
    }

    fn current_context(&self) -> Option<ContextHandle> {
        let raw = unsafe { (self.functions.get_current_context)() };
        ContextHandle::from_raw(raw as usize)
    }

    fn process_context(&self, context: ContextHandle) {
        unsafe { (self.functions.process_context)(Self::raw_context(Some(context))) }
    }

    fn suspend_context(&self, context: ContextHandle) {
        unsafe { (self.functions.suspend_context)(Self::raw_context(Some(context))) }
    }

    fn is_extension_present(&self, device: Option<DeviceHandle>, name: &str) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        unsafe { (self.functions.is_extension_present)(Self::raw_device(device), name.as_ptr()) != 0 }
    }

    fn get_integer(&self, device: Option<DeviceHandle>, param: i32, count: usize) -> Vec<i32> {
        let mut values = vec![0; count];
        if count > 0 {
            unsafe {
                (self.functions.get_integerv)(
                    Self::raw_device(device),
                    param,
                    count as c_int,
                    values.as_mut_ptr(),
                )
            };
        }
        values
    }

    fn get_string(&self, device: Option<DeviceHandle>, param: i32) -> Option<String> {
        let raw = unsafe { (self.functions.get_string)(Self::raw_device(device), param) };
        if raw.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
    }

    fn get_string_list(&self, device: Option<DeviceHandle>, param: i32) -> Vec<String> {
        let mut cursor = unsafe { (self.functions.get_string)(Self::raw_device(device), param) };
        let mut names = Vec::new();
        if cursor.is_null() {
            return names;
        }

        // Entries are NUL-separated and the list ends with an empty entry
        loop {
            let entry = unsafe { CStr::from_ptr(cursor) };
            let bytes = entry.to_bytes();
            if bytes.is_empty() {
                break;
            }
            names.push(String::from_utf8_lossy(bytes).into_owned());
            cursor = unsafe { cursor.add(bytes.len() + 1) };
        }
        names
    }

    fn last_error(&self, device: Option<DeviceHandle>) -> AlcErrorCode {
        AlcErrorCode::from(unsafe { (self.functions.get_error)(Self::raw_device(device)) })
    }
}

/// Production implementation of DeviceDirectory that answers through the driver
pub struct DriverDirectory<D: AudioDriver> {
    driver: D,
}

impl<D: AudioDriver> DriverDirectory<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    fn supports_enumerate_all(&self) -> bool {
        self.driver.is_extension_present(None, alc::EXT_ENUMERATE_ALL)
    }
}

impl<D: AudioDriver> DeviceDirectory for DriverDirectory<D> {
    fn playback_devices(&self) -> Vec<String> {
        if self.supports_enumerate_all() {
            self.driver
                .get_string_list(None, alc::ALC_ALL_DEVICES_SPECIFIER)
        } else if self.supports_enumeration() {
            self.driver.get_string_list(None, alc::ALC_DEVICE_SPECIFIER)
        } else {
            Vec::new()
        }
    }

    fn default_playback_device(&self) -> Option<String> {
        let param = if self.supports_enumerate_all() {
            alc::ALC_DEFAULT_ALL_DEVICES_SPECIFIER
        } else {
            alc::ALC_DEFAULT_DEVICE_SPECIFIER
        };
        self.driver
            .get_string(None, param)
            .filter(|name| !name.is_empty())
    }

    fn supports_enumeration(&self) -> bool {
        self.driver.is_extension_present(None, alc::EXT_ENUMERATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::mocks::MockAudioDriver;

    #[test]
    fn test_directory_lists_devices_when_enumeration_is_supported() {
        let driver = MockAudioDriver::new();
        driver.add_device("Speakers");
        driver.add_device("Headphones");
        let directory = DriverDirectory::new(driver);

        assert!(directory.supports_enumeration());
        assert_eq!(directory.playback_devices(), vec!["Speakers", "Headphones"]);
    }

    #[test]
    fn test_directory_without_enumeration_lists_nothing() {
        let driver = MockAudioDriver::new();
        driver.add_device("Speakers");
        driver.remove_extension(alc::EXT_ENUMERATION);
        let directory = DriverDirectory::new(driver);

        assert!(!directory.supports_enumeration());
        assert!(directory.playback_devices().is_empty());
    }

    #[test]
    fn test_directory_reports_default_device() {
        let driver = MockAudioDriver::new();
        driver.set_default_device_name("Speakers");
        let directory = DriverDirectory::new(driver.clone());
        assert_eq!(directory.default_playback_device(), Some("Speakers".to_string()));

        driver.set_default_device_name("");
        assert_eq!(directory.default_playback_device(), None);
    }
}
