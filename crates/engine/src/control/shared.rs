use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::persist::KeyValueStore;

use super::controller::GameStateController;

static CONTROLLER_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_controller_lock_poison_once() {
    if CONTROLLER_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!("controller lock poisoned; recovered inner value");
    }
}

/// Controller handle for callers on several threads. Each `with` call holds the
/// lock for the whole handler, so handlers never interleave.
pub struct SharedController<S> {
    inner: Arc<Mutex<GameStateController<S>>>,
}

impl<S> Clone for SharedController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SharedController<S> {
    pub fn new(controller: GameStateController<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn with<R>(&self, handler: impl FnOnce(&mut GameStateController<S>) -> R) -> R {
        let mut guard = self.lock();
        handler(&mut guard)
    }

    fn lock(&self) -> MutexGuard<'_, GameStateController<S>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_controller_lock_poison_once();
                poisoned.into_inner()
            }
        }
    }
}
