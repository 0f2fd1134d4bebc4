//! Reentrancy guard.
//!
//! Remembers which thread is executing a call. A collaborator that calls back
//! into the store from inside that call runs on the same thread and is
//! rejected instead of deadlocking on the call lock. Other threads are not
//! affected; they wait for the call lock as usual, which also means a
//! callback forwarded to another thread and joined is not detected.

use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// Tracks the thread currently executing a call.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    owner: Mutex<Option<ThreadId>>,
}

impl ReentrancyGuard {
    /// Create an idle guard
    #[must_use]
    pub const fn new() -> Self {
        Self {
            owner: Mutex::new(None),
        }
    }

    /// Whether the current thread is already inside a call
    #[must_use]
    pub fn is_reentrant(&self) -> bool {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    /// Mark the current thread as executing a call until the returned token drops.
    ///
    /// Only call this while holding the store's call lock.
    #[must_use]
    pub fn enter(&self) -> Entered<'_> {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Entered { guard: self }
    }
}

/// Proof that the current thread is executing a call.
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        *self
            .guard
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
