//! Engine lifecycle handle.
//!
//! # Responsibility
//! - Track `Uninitialized -> Initializing -> Ready | Failed` for the shared bridge.
//! - Let any number of consumers block until the bridge is usable.
//!
//! # Invariants
//! - Initialization runs at most once per handle.
//! - `Ready` and `Failed` are terminal.

use crate::bridge::{BridgeConfig, BridgeError, BridgeResult, PersistenceBridge};
use crate::cache::SnapshotCache;
use log::error;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const INIT_THREAD_NAME: &str = "parqtodo-init";

/// Observable lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

enum Slot {
    Uninitialized,
    Initializing,
    Ready(Arc<PersistenceBridge>),
    Failed(String),
}

struct Shared {
    slot: Mutex<Slot>,
    changed: Condvar,
}

/// Cloneable handle to one lazily initialized `PersistenceBridge`.
#[derive(Clone)]
pub struct StoreHandle {
    shared: Arc<Shared>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Uninitialized),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &*self.lock() {
            Slot::Uninitialized => LifecycleState::Uninitialized,
            Slot::Initializing => LifecycleState::Initializing,
            Slot::Ready(_) => LifecycleState::Ready,
            Slot::Failed(reason) => LifecycleState::Failed(reason.clone()),
        }
    }

    /// Starts initialization on a background thread and returns immediately.
    ///
    /// # Errors
    /// - `AlreadyStarted` when this handle left `Uninitialized` before.
    /// - `InitFailed` when the background thread cannot be spawned.
    pub fn start(&self, config: BridgeConfig, cache: Arc<dyn SnapshotCache>) -> BridgeResult<()> {
        self.start_with(move || PersistenceBridge::initialize(&config, cache))
    }

    /// Like `start`, with a custom initializer.
    pub fn start_with<F>(&self, init: F) -> BridgeResult<()>
    where
        F: FnOnce() -> BridgeResult<PersistenceBridge> + Send + 'static,
    {
        self.begin()?;
        let handle = self.clone();
        let spawned = thread::Builder::new()
            .name(INIT_THREAD_NAME.to_string())
            .spawn(move || handle.finish(init()));
        if let Err(err) = spawned {
            let reason = format!("cannot spawn init thread: {err}");
            self.finish(Err(BridgeError::InitFailed(reason.clone())));
            return Err(BridgeError::InitFailed(reason));
        }
        Ok(())
    }

    /// Runs initialization on the calling thread.
    pub fn initialize_now(
        &self,
        config: &BridgeConfig,
        cache: Arc<dyn SnapshotCache>,
    ) -> BridgeResult<Arc<PersistenceBridge>> {
        self.initialize_now_with(|| PersistenceBridge::initialize(config, cache))
    }

    pub fn initialize_now_with<F>(&self, init: F) -> BridgeResult<Arc<PersistenceBridge>>
    where
        F: FnOnce() -> BridgeResult<PersistenceBridge>,
    {
        self.begin()?;
        self.finish(init());
        self.wait_ready()
    }

    /// Blocks until initialization finishes.
    ///
    /// # Errors
    /// - `NotStarted` when initialization was never started.
    /// - `InitFailed` when initialization failed.
    pub fn wait_ready(&self) -> BridgeResult<Arc<PersistenceBridge>> {
        let mut slot = self.lock();
        while matches!(*slot, Slot::Initializing) {
            slot = self
                .shared
                .changed
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        resolve(&slot)
    }

    /// Bounded `wait_ready`; returns `NotReady` when `timeout` elapses first.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> BridgeResult<Arc<PersistenceBridge>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        while matches!(*slot, Slot::Initializing) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BridgeError::NotReady);
            }
            let (next, _) = self
                .shared
                .changed
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            slot = next;
        }
        resolve(&slot)
    }

    /// Returns the bridge when already `Ready`, without blocking.
    pub fn try_ready(&self) -> Option<Arc<PersistenceBridge>> {
        match &*self.lock() {
            Slot::Ready(bridge) => Some(Arc::clone(bridge)),
            _ => None,
        }
    }

    fn begin(&self) -> BridgeResult<()> {
        let mut slot = self.lock();
        if !matches!(*slot, Slot::Uninitialized) {
            return Err(BridgeError::AlreadyStarted);
        }
        *slot = Slot::Initializing;
        Ok(())
    }

    fn finish(&self, outcome: BridgeResult<PersistenceBridge>) {
        let next = match outcome {
            Ok(bridge) => Slot::Ready(Arc::new(bridge)),
            Err(err) => {
                error!(
                    "event=store_lifecycle module=bridge status=failed error_code={} error={}",
                    err.code(),
                    err
                );
                Slot::Failed(err.to_string())
            }
        };
        *self.lock() = next;
        self.shared.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve(slot: &Slot) -> BridgeResult<Arc<PersistenceBridge>> {
    match slot {
        Slot::Ready(bridge) => Ok(Arc::clone(bridge)),
        Slot::Failed(reason) => Err(BridgeError::InitFailed(reason.clone())),
        Slot::Uninitialized => Err(BridgeError::NotStarted),
        Slot::Initializing => Err(BridgeError::NotReady),
    }
}
