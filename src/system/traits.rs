use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::AlcErrorCode;

/// Opaque handle to an open native playback device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(NonZeroUsize);

/// Opaque handle to a native context created on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(NonZeroUsize);

macro_rules! impl_handle {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw handle value; zero (the null handle) yields `None`
            pub fn from_raw(raw: usize) -> Option<Self> {
                NonZeroUsize::new(raw).map(Self)
            }

            pub fn as_raw(self) -> usize {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0.get())
            }
        }
    };
}

impl_handle!(DeviceHandle);
impl_handle!(ContextHandle);

/// Trait for the native audio driver call surface - abstracts the ALC entry points.
///
/// Every primitive is non-panicking. Failure is signalled by a `None`/`false`
/// return and the driver's out-of-band error code, read with [`last_error`].
///
/// [`last_error`]: AudioDriver::last_error
pub trait AudioDriver: Send + Sync {
    /// Open a playback device by name, or the unnamed default device for `None`
    fn open_device(&self, name: Option<&str>) -> Option<DeviceHandle>;

    /// Close a device previously returned by `open_device`
    fn close_device(&self, device: DeviceHandle) -> bool;

    /// Create a context from a zero-terminated attribute list
    fn create_context(&self, device: DeviceHandle, attributes: &[i32]) -> Option<ContextHandle>;

    fn destroy_context(&self, context: ContextHandle);

    /// Make the given context (or none) current for the whole process
    fn make_context_current(&self, context: Option<ContextHandle>) -> bool;

    /// The context currently selected on the driver, if any
    fn current_context(&self) -> Option<ContextHandle>;

    fn process_context(&self, context: ContextHandle);

    fn suspend_context(&self, context: ContextHandle);

    fn is_extension_present(&self, device: Option<DeviceHandle>, name: &str) -> bool;

    /// Query `count` integers for `param`; missing values are reported as zero
    fn get_integer(&self, device: Option<DeviceHandle>, param: i32, count: usize) -> Vec<i32>;

    fn get_string(&self, device: Option<DeviceHandle>, param: i32) -> Option<String>;

    /// Query a NUL-separated string list (device specifier lists)
    fn get_string_list(&self, device: Option<DeviceHandle>, param: i32) -> Vec<String>;

    /// Read and clear the last error recorded for `device` (or globally for `None`)
    fn last_error(&self, device: Option<DeviceHandle>) -> AlcErrorCode;
}

/// Trait for the read-only playback device directory
pub trait DeviceDirectory: Send + Sync {
    /// Whether a native audio library was found on the host
    fn is_driver_available(&self) -> bool {
        true
    }

    /// Ordered list of known playback device names
    fn playback_devices(&self) -> Vec<String>;

    /// Name of the default playback device, if the driver reports one
    fn default_playback_device(&self) -> Option<String>;

    /// Whether the driver can enumerate devices (legacy drivers cannot)
    fn supports_enumeration(&self) -> bool;
}

impl<T: AudioDriver + ?Sized> AudioDriver for Arc<T> {
    fn open_device(&self, name: Option<&str>) -> Option<DeviceHandle> {
        (**self).open_device(name)
    }

    fn close_device(&self, device: DeviceHandle) -> bool {
        (**self).close_device(device)
    }

    fn create_context(&self, device: DeviceHandle, attributes: &[i32]) -> Option<ContextHandle> {
        (**self).create_context(device, attributes)
    }

    fn destroy_context(&self, context: ContextHandle) {
        (**self).destroy_context(context)
    }

    fn make_context_current(&self, context: Option<ContextHandle>) -> bool {
        (**self).make_context_current(context)
    }

    fn current_context(&self) -> Option<ContextHandle> {
        (**self).current_context()
    }

    fn process_context(&self, context: ContextHandle) {
        (**self).process_context(context)
    }

    fn suspend_context(&self, context: ContextHandle) {
        (**self).suspend_context(context)
    }

    fn is_extension_present(&self, device: Option<DeviceHandle>, name: &str) -> bool {
        (**self).is_extension_present(device, name)
    }

    fn get_integer(&self, device: Option<DeviceHandle>, param: i32, count: usize) -> Vec<i32> {
        (**self).get_integer(device, param, count)
    }

    fn get_string(&self, device: Option<DeviceHandle>, param: i32) -> Option<String> {
        (**self).get_string(device, param)
    }

    fn get_string_list(&self, device: Option<DeviceHandle>, param: i32) -> Vec<String> {
        (**self).get_string_list(device, param)
    }

    fn last_error(&self, device: Option<DeviceHandle>) -> AlcErrorCode {
        (**self).last_error(device)
    }
}
