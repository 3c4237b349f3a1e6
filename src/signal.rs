use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

/// A one-shot wakeup for a single parked thread.
///
/// The signal is bound to the thread that created it; `notify` may be called
/// from any thread. Once fired, the signal stays fired, so a notification
/// that races with `wait` is never lost.
pub(crate) struct Signal {
    fired: AtomicBool,
    thread: Thread,
}

impl Signal {
    /// Creates a signal bound to the current thread.
    pub(crate) fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            thread: thread::current(),
        }
    }

    /// Parks the current thread until the signal fires.
    pub(crate) fn wait(&self) {
        while !self.fired.load(Ordering::Acquire) {
            thread::park();
        }
    }

    /// Fires the signal, waking the bound thread.
    pub(crate) fn notify(&self) {
        self.fired.store(true, Ordering::Release);
        self.thread.unpark();
    }
}
