//! Synchronization utilities for robust mutex handling
//!
//! Channel state is only ever mutated by short, non-panicking critical
//! sections, so a poisoned lock still guards consistent data. Rather than
//! propagating poison as a panic, these helpers log it and hand back the
//! guard.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked
///
/// # Arguments
/// * `mutex` - The mutex to lock
/// * `context` - Short description of the guarded state, used in the log line
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'a, T>>| {
        log::error!(
            "Internal synchronisation error (mutex poisoned) while accessing {}; recovering state",
            context
        );
        poisoned.into_inner()
    })
}
