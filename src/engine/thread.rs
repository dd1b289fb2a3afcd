//! UI thread affinity.
//!
//! A [`Context`](super::Context) records the thread it was created on. Every
//! entry point checks it; running on any other thread is a caller bug and
//! panics.

use std::thread::{self, ThreadId};

/// The single thread a component tree may be driven from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiThread {
    id: ThreadId,
}

impl UiThread {
    /// Bind to the calling thread.
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Panic unless called on the bound thread.
    #[track_caller]
    pub fn assert_current(&self, operation: &str) {
        if !self.is_current() {
            panic!(
                "{operation} must run on the UI thread {:?}, called from {:?}",
                self.id,
                thread::current().id()
            );
        }
    }
}

impl Default for UiThread {
    fn default() -> Self {
        Self::current()
    }
}
