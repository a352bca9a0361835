use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::attributes::{AttributeList, negotiate_auxiliary_sends};
use super::device::open_with_fallback;
use super::manager::{ContextManager, RegistryGuard};
use crate::config::ContextConfig;
use crate::error::{AlcErrorCode, ContextError, Operation, Result};
use crate::system::alc;
use crate::system::{AudioDriver, ContextHandle, DeviceDirectory, DeviceHandle};

/// Shared state behind every clone of an [`AudioContext`]
pub(crate) struct ContextInner<D: AudioDriver, E: DeviceDirectory> {
    manager: Arc<ContextManager<D, E>>,
    device: DeviceHandle,
    context: ContextHandle,
    device_name: String,
    attributes: AttributeList,
    synchronized: bool,
    processing: AtomicBool,
    teardown_claimed: AtomicBool,
    disposed: AtomicBool,
}

impl<D: AudioDriver, E: DeviceDirectory> ContextInner<D, E> {
    pub(crate) fn handle(&self) -> ContextHandle {
        self.context
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ContextError::UseAfterDispose(format!(
                "audio context on '{}'",
                self.device_name
            )));
        }
        Ok(())
    }

    /// Run `f` under the manager lock if the context is still live
    fn with_live<T>(&self, f: impl FnOnce(&RegistryGuard<'_, D, E>) -> Result<T>) -> Result<T> {
        let guard = self.manager.lock();
        self.ensure_live()?;
        f(&guard)
    }

    fn operation_error(&self, operation: Operation, code: AlcErrorCode) -> ContextError {
        ContextError::ContextOperationFailed {
            operation,
            target: self.to_string(),
            code,
        }
    }

    /// Read the device error state after a native call
    fn check_device(&self, operation: Operation) -> Result<()> {
        let code = self.manager.driver().last_error(Some(self.device));
        if code.is_error() {
            return Err(self.operation_error(operation, code));
        }
        Ok(())
    }

    fn query_integer(&self, param: i32) -> Result<i32> {
        self.with_live(|_| {
            Ok(self
                .manager
                .driver()
                .get_integer(Some(self.device), param, 1)
                .first()
                .copied()
                .unwrap_or(0))
        })
    }

    /// Release both native handles exactly once
    fn release(&self) {
        if self
            .teardown_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let mut state = self.manager.lock();
        let driver = self.manager.driver();

        if driver.current_context() == Some(self.context) && !driver.make_context_current(None) {
            warn!(
                "Could not clear current context while disposing {}: ALC {}",
                self,
                driver.last_error(Some(self.device))
            );
        }

        state.remove(self.context);
        driver.destroy_context(self.context);

        if !driver.close_device(self.device) {
            warn!("Device '{}' reported an error on close", self.device_name);
        }

        self.disposed.store(true, Ordering::Release);
        drop(state);

        info!("Disposed audio context on '{}'", self.device_name);
    }
}

impl<D: AudioDriver, E: DeviceDirectory> Drop for ContextInner<D, E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: AudioDriver, E: DeviceDirectory> fmt::Display for ContextInner<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (handle: {}, device: {})",
            self.device_name, self.context, self.device
        )
    }
}

/// A live device + context pair.
///
/// Clones share the same native resources. The resources are released by an
/// explicit [`dispose`](AudioContext::dispose) or when the last clone is
/// dropped, whichever happens first.
pub struct AudioContext<D: AudioDriver, E: DeviceDirectory> {
    inner: Arc<ContextInner<D, E>>,
}

impl<D: AudioDriver, E: DeviceDirectory> AudioContext<D, E> {
    /// Open a device and create a context on it.
    ///
    /// Construction is all-or-nothing: any device or context opened along the
    /// way is released before an error is returned.
    pub fn open(manager: &Arc<ContextManager<D, E>>, config: &ContextConfig) -> Result<Self> {
        config.validate()?;

        let directory = manager.directory();
        if !directory.is_driver_available() {
            return Err(ContextError::DriverAbsent(
                "no OpenAL implementation is installed".to_string(),
            ));
        }

        let enumeration_supported = directory.supports_enumeration();
        let playback_devices = if enumeration_supported {
            directory.playback_devices()
        } else {
            Vec::new()
        };
        if enumeration_supported && playback_devices.is_empty() {
            return Err(ContextError::Unsupported(
                "no audio hardware is available".to_string(),
            ));
        }

        let reservation = manager.reserve()?;
        let driver = manager.driver();

        let opened = open_with_fallback(driver, directory, config.requested_device())?;
        let auxiliary_sends =
            negotiate_auxiliary_sends(config, driver, opened.handle, enumeration_supported);
        let attributes = AttributeList::negotiate(config, auxiliary_sends);
        debug!(
            "Creating context on '{}' with attributes [{}]",
            opened.name, attributes
        );

        let creation_failed = |code: AlcErrorCode| ContextError::ContextCreationFailed {
            device: opened.name.clone(),
            attributes: attributes.to_string(),
            code,
        };

        let Some(context) = driver.create_context(opened.handle, attributes.as_slice()) else {
            let code = driver.last_error(Some(opened.handle));
            driver.close_device(opened.handle);
            return Err(creation_failed(code));
        };

        let rollback = |err: ContextError| {
            driver.destroy_context(context);
            driver.close_device(opened.handle);
            err
        };

        let code = driver.last_error(Some(opened.handle));
        if code.is_error() {
            return Err(rollback(creation_failed(code)));
        }

        // Legacy drivers without enumeration are known to crash on make-current
        if !playback_devices.is_empty() {
            let description = format!(
                "{} (handle: {}, device: {})",
                opened.name, context, opened.handle
            );
            let guard = manager.lock();
            let switched =
                manager.switch_current(&guard, Some((context, opened.handle)), &description);
            drop(guard);
            switched.map_err(rollback)?;
        }

        let device_name = driver
            .get_string(Some(opened.handle), alc::ALC_DEVICE_SPECIFIER)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| opened.name.clone());

        let inner = Arc::new(ContextInner {
            manager: Arc::clone(manager),
            device: opened.handle,
            context,
            device_name,
            attributes,
            synchronized: config.synchronous,
            processing: AtomicBool::new(false),
            teardown_claimed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        });
        reservation.commit(&inner);

        info!("Opened audio context: {}", inner);
        Ok(Self { inner })
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner<D, E>>) -> Self {
        Self { inner }
    }

    pub fn manager(&self) -> &Arc<ContextManager<D, E>> {
        &self.inner.manager
    }

    /// Make this the driver's current context
    pub fn make_current(&self) -> Result<()> {
        let inner = &*self.inner;
        inner.with_live(|guard| {
            inner.manager.switch_current(
                guard,
                Some((inner.context, inner.device)),
                &inner.to_string(),
            )
        })
    }

    /// Whether the driver reports this context as current
    pub fn is_current(&self) -> Result<bool> {
        let inner = &*self.inner;
        inner.with_live(|guard| {
            Ok(guard.contexts.contains_key(&inner.context)
                && inner.manager.driver().current_context() == Some(inner.context))
        })
    }

    /// Make this context current, or clear the current context
    pub fn set_current(&self, current: bool) -> Result<()> {
        if current {
            return self.make_current();
        }
        let inner = &*self.inner;
        inner.with_live(|guard| inner.manager.switch_current(guard, None, "null"))
    }

    /// Resume processing on this context
    pub fn process(&self) -> Result<()> {
        let inner = &*self.inner;
        inner.with_live(|_| {
            inner.manager.driver().process_context(inner.context);
            inner.check_device(Operation::Process)?;
            inner.processing.store(true, Ordering::Release);
            Ok(())
        })
    }

    /// Suspend processing on this context
    pub fn suspend(&self) -> Result<()> {
        let inner = &*self.inner;
        inner.with_live(|_| {
            inner.manager.driver().suspend_context(inner.context);
            inner.check_device(Operation::Suspend)?;
            inner.processing.store(false, Ordering::Release);
            Ok(())
        })
    }

    pub fn is_processing(&self) -> Result<bool> {
        self.inner.ensure_live()?;
        Ok(self.inner.processing.load(Ordering::Acquire))
    }

    pub fn is_synchronized(&self) -> Result<bool> {
        self.inner.ensure_live()?;
        Ok(self.inner.synchronized)
    }

    pub fn supports_extension(&self, name: &str) -> Result<bool> {
        let inner = &*self.inner;
        inner.with_live(|_| {
            Ok(inner
                .manager
                .driver()
                .is_extension_present(Some(inner.device), name))
        })
    }

    /// Name of the device actually bound, which may differ from the request
    pub fn current_device(&self) -> Result<&str> {
        self.inner.ensure_live()?;
        Ok(&self.inner.device_name)
    }

    /// Mono sources the driver currently grants this context
    pub fn mono_sources(&self) -> Result<i32> {
        self.inner.query_integer(alc::ALC_MONO_SOURCES)
    }

    /// Stereo sources the driver currently grants this context
    pub fn stereo_sources(&self) -> Result<i32> {
        self.inner.query_integer(alc::ALC_STEREO_SOURCES)
    }

    /// Fail if the driver has recorded an error for this device
    pub fn check_errors(&self) -> Result<()> {
        let inner = &*self.inner;
        inner.with_live(|_| inner.check_device(Operation::CheckErrors))
    }

    /// Read (and clear) the device's pending error code
    pub fn current_error(&self) -> Result<AlcErrorCode> {
        let inner = &*self.inner;
        inner.with_live(|_| Ok(inner.manager.driver().last_error(Some(inner.device))))
    }

    /// The attribute list the context was created with
    pub fn attributes(&self) -> Result<&AttributeList> {
        self.inner.ensure_live()?;
        Ok(&self.inner.attributes)
    }

    /// `None` once the context has been disposed
    pub fn context_handle(&self) -> Option<ContextHandle> {
        (!self.inner.is_disposed()).then_some(self.inner.context)
    }

    /// `None` once the context has been disposed
    pub fn device_handle(&self) -> Option<DeviceHandle> {
        (!self.inner.is_disposed()).then_some(self.inner.device)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Release the native context and device. Idempotent, never fails.
    pub fn dispose(&self) {
        self.inner.release();
    }
}

impl<D: AudioDriver, E: DeviceDirectory> Clone for AudioContext<D, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: AudioDriver, E: DeviceDirectory> PartialEq for AudioContext<D, E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<D: AudioDriver, E: DeviceDirectory> Eq for AudioContext<D, E> {}

impl<D: AudioDriver, E: DeviceDirectory> fmt::Display for AudioContext<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl<D: AudioDriver, E: DeviceDirectory> fmt::Debug for AudioContext<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("device_name", &self.inner.device_name)
            .field("context", &self.inner.context)
            .field("device", &self.inner.device)
            .field("processing", &self.inner.processing.load(Ordering::Acquire))
            .field("synchronized", &self.inner.synchronized)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
