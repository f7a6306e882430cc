//! Cooperative cancellation token.
//!
//! A cancellation request sets the flag and delivers SIGTERM to every
//! registered child process group, so the in-flight collaborator's full
//! process tree terminates. The coordinator observes the flag at its
//! next stage boundary; there is no preemption beyond signal delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    /// Process-group ids of in-flight collaborator invocations.
    groups: Mutex<Vec<i32>>,
}

/// Clonable cancellation token threaded into every stage invocation.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation: set the flag and signal every in-flight
    /// collaborator's process group.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let groups = self.inner.groups.lock();
        for pgid in groups.iter() {
            signal_group(*pgid);
        }
    }

    /// Register a spawned collaborator's process group.
    ///
    /// If cancellation already happened, the group is signalled
    /// immediately so a racing spawn cannot outlive the request.
    pub(crate) fn register_group(&self, pgid: i32) {
        self.inner.groups.lock().push(pgid);
        if self.is_cancelled() {
            signal_group(pgid);
        }
    }

    /// Remove a finished collaborator's process group.
    pub(crate) fn clear_group(&self, pgid: i32) {
        self.inner.groups.lock().retain(|g| *g != pgid);
    }

    #[cfg(test)]
    pub(crate) fn registered_groups(&self) -> Vec<i32> {
        self.inner.groups.lock().clone()
    }
}

#[cfg(unix)]
fn signal_group(pgid: i32) {
    // Children are spawned with process_group(0), so the pgid equals
    // the child pid and the signal reaches the whole tree.
    unsafe {
        libc::killpg(pgid, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn signal_group(_pgid: i32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn groups_register_and_clear() {
        let token = CancelToken::new();
        token.register_group(4242);
        assert_eq!(token.registered_groups(), vec![4242]);
        token.clear_group(4242);
        assert!(token.registered_groups().is_empty());
    }
}
