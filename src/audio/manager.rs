//! Process-wide currency arbitration.
//!
//! The driver's current-context pointer is global to the process, so a single
//! lock guards the context registry, the "a context exists" state and every
//! call that reads or writes the driver's current context.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error};

use super::context::{AudioContext, ContextInner};
use crate::config::ContextConfig;
use crate::error::{ContextError, Operation, Result};
use crate::system::{
    AudioDriver, ContextHandle, DeviceDirectory, DeviceHandle, DriverDirectory, OpenAlDriver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Allow at most one live context at a time
    pub exclusive: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self { exclusive: true }
    }
}

/// Registry state guarded by the manager lock
pub(crate) struct RegistryState<D: AudioDriver, E: DeviceDirectory> {
    pub(crate) contexts: HashMap<ContextHandle, Weak<ContextInner<D, E>>>,
    context_exists: bool,
    construction_pending: bool,
}

impl<D: AudioDriver, E: DeviceDirectory> RegistryState<D, E> {
    pub(crate) fn remove(&mut self, handle: ContextHandle) {
        self.contexts.remove(&handle);
        self.context_exists = !self.contexts.is_empty();
    }
}

pub(crate) type RegistryGuard<'a, D, E> = MutexGuard<'a, RegistryState<D, E>>;

/// Owns the driver binding and the device directory, and arbitrates which
/// context is current
pub struct ContextManager<D: AudioDriver, E: DeviceDirectory> {
    driver: D,
    directory: E,
    options: ManagerOptions,
    state: Mutex<RegistryState<D, E>>,
}

impl<D: AudioDriver, E: DeviceDirectory> ContextManager<D, E> {
    pub fn new(driver: D, directory: E) -> Arc<Self> {
        Self::with_options(driver, directory, ManagerOptions::default())
    }

    pub fn with_options(driver: D, directory: E, options: ManagerOptions) -> Arc<Self> {
        Arc::new(Self {
            driver,
            directory,
            options,
            state: Mutex::new(RegistryState {
                contexts: HashMap::new(),
                context_exists: false,
                construction_pending: false,
            }),
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn directory(&self) -> &E {
        &self.directory
    }

    pub fn options(&self) -> ManagerOptions {
        self.options
    }

    /// Negotiate and open a new context, see [`AudioContext::open`]
    pub fn open_context(self: &Arc<Self>, config: &ContextConfig) -> Result<AudioContext<D, E>> {
        AudioContext::open(self, config)
    }

    /// The registered context the driver currently reports as current
    pub fn current_context(&self) -> Option<AudioContext<D, E>> {
        let state = self.lock();
        if state.contexts.is_empty() {
            return None;
        }
        let found = self
            .driver
            .current_context()
            .and_then(|handle| state.contexts.get(&handle))
            .and_then(Weak::upgrade);
        // The upgraded handle must outlive the guard: dropping the last
        // strong reference re-enters the lock through disposal.
        drop(state);
        found.map(AudioContext::from_inner)
    }

    /// Make `context` current, or clear the current context for `None`
    pub fn make_current(&self, context: Option<&AudioContext<D, E>>) -> Result<()> {
        match context {
            Some(context) => {
                if !std::ptr::eq(Arc::as_ptr(context.manager()), self) {
                    return Err(ContextError::Unsupported(format!(
                        "{} belongs to a different context manager",
                        context
                    )));
                }
                context.make_current()
            }
            None => {
                let state = self.lock();
                self.switch_current(&state, None, "null")
            }
        }
    }

    /// Playback device names in driver order
    pub fn available_devices(&self) -> Result<Vec<String>> {
        if !self.directory.supports_enumeration() {
            return Err(ContextError::Unsupported(
                "the audio driver does not support device enumeration".to_string(),
            ));
        }
        Ok(self.directory.playback_devices())
    }

    pub fn default_device(&self) -> Option<String> {
        self.directory.default_playback_device()
    }

    /// Number of live contexts in the registry
    pub fn context_count(&self) -> usize {
        self.lock().contexts.len()
    }

    pub fn context_exists(&self) -> bool {
        self.lock().context_exists
    }

    pub(crate) fn lock(&self) -> RegistryGuard<'_, D, E> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the right to construct a context. In exclusive mode this fails
    /// while another context exists or is being constructed.
    pub(crate) fn reserve(&self) -> Result<Reservation<'_, D, E>> {
        let mut state = self.lock();
        if self.options.exclusive {
            if state.context_exists || state.construction_pending {
                return Err(ContextError::Unsupported(
                    "multiple audio contexts are not supported".to_string(),
                ));
            }
            state.construction_pending = true;
        }
        Ok(Reservation {
            manager: self,
            committed: false,
        })
    }

    /// Point the driver at `target`. The caller proves it holds the lock by
    /// passing the guard.
    pub(crate) fn switch_current(
        &self,
        _guard: &RegistryGuard<'_, D, E>,
        target: Option<(ContextHandle, DeviceHandle)>,
        description: &str,
    ) -> Result<()> {
        debug!("Making context current: {}", description);
        if self.driver.make_context_current(target.map(|(context, _)| context)) {
            return Ok(());
        }

        let code = self.driver.last_error(target.map(|(_, device)| device));
        error!("ALC {} error making {} current", code, description);
        Err(ContextError::ContextOperationFailed {
            operation: Operation::MakeCurrent,
            target: description.to_string(),
            code,
        })
    }
}

/// Construction slot held while a context is being opened; released on drop
/// unless committed
pub(crate) struct Reservation<'a, D: AudioDriver, E: DeviceDirectory> {
    manager: &'a ContextManager<D, E>,
    committed: bool,
}

impl<D: AudioDriver, E: DeviceDirectory> Reservation<'_, D, E> {
    pub(crate) fn commit(mut self, inner: &Arc<ContextInner<D, E>>) {
        let mut state = self.manager.lock();
        state
            .contexts
            .insert(inner.handle(), Arc::downgrade(inner));
        state.context_exists = true;
        state.construction_pending = false;
        self.committed = true;
    }
}

impl<D: AudioDriver, E: DeviceDirectory> Drop for Reservation<'_, D, E> {
    fn drop(&mut self) {
        if !self.committed {
            self.manager.lock().construction_pending = false;
        }
    }
}

/// The production manager, bound to the host's OpenAL library
pub type OpenAlManager = ContextManager<Arc<OpenAlDriver>, DriverDirectory<Arc<OpenAlDriver>>>;

static GLOBAL_MANAGER: OnceCell<Arc<OpenAlManager>> = OnceCell::new();

impl ContextManager<Arc<OpenAlDriver>, DriverDirectory<Arc<OpenAlDriver>>> {
    /// The process-wide manager, loading OpenAL on first use
    pub fn global() -> Result<Arc<Self>> {
        GLOBAL_MANAGER
            .get_or_try_init(|| {
                let driver = Arc::new(OpenAlDriver::load()?);
                Ok::<_, ContextError>(ContextManager::new(
                    Arc::clone(&driver),
                    DriverDirectory::new(driver),
                ))
            })
            .cloned()
    }
}
