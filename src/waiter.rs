use std::collections::VecDeque;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::signal::Signal;

const UNCLAIMED: isize = -1;
const ABORTED: isize = -2;

/// Shared commit cell for one select call.
///
/// Starts unclaimed; exactly one `try_claim` or `try_abort` ever succeeds. A
/// claimed token records the index of the winning operation. An aborted token
/// commits nothing and only invalidates waiters still parked under it.
pub(crate) struct CommitToken {
    state: AtomicIsize,
}

impl CommitToken {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicIsize::new(UNCLAIMED),
        }
    }

    /// Claims the token for operation `index`.
    pub(crate) fn try_claim(&self, index: usize) -> bool {
        self.state
            .compare_exchange(
                UNCLAIMED,
                index as isize,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Claims the token without committing any operation.
    pub(crate) fn try_abort(&self) -> bool {
        self.state
            .compare_exchange(UNCLAIMED, ABORTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_claimed(&self) -> bool {
        self.state.load(Ordering::Acquire) != UNCLAIMED
    }

    /// Index of the committed operation, if one committed.
    pub(crate) fn winner(&self) -> Option<usize> {
        let state = self.state.load(Ordering::Acquire);
        if state >= 0 {
            Some(state as usize)
        } else {
            None
        }
    }
}

struct WaiterState<T> {
    value: Option<T>,
    token: Option<Arc<CommitToken>>,
    index: usize,
    signal: Option<Arc<Signal>>,
}

/// A suspended send or receive.
///
/// The slot carries the outgoing value for a sender and the delivered value
/// for a receiver. Fields are touched either by the owning thread while the
/// waiter is unqueued, or under the owning channel's lock while it is queued;
/// the interior mutex makes both sides safe. Lock order is always channel
/// before waiter.
pub(crate) struct Waiter<T> {
    state: Mutex<WaiterState<T>>,
}

impl<T> Waiter<T> {
    fn lock(&self) -> MutexGuard<'_, WaiterState<T>> {
        self.state.lock().unwrap()
    }

    fn with_slot(value: Option<T>, signal: Option<Arc<Signal>>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(WaiterState {
                value,
                token: None,
                index: 0,
                signal,
            }),
        })
    }

    /// Creates a waiter for a plain blocking send, bound to the current
    /// thread.
    pub(crate) fn sender(value: T) -> Arc<Self> {
        Self::with_slot(Some(value), Some(Arc::new(Signal::new())))
    }

    /// Creates a waiter for a plain blocking receive, bound to the current
    /// thread.
    pub(crate) fn receiver() -> Arc<Self> {
        Self::with_slot(None, Some(Arc::new(Signal::new())))
    }

    /// Creates an unbound waiter for a select operation.
    pub(crate) fn detached() -> Arc<Self> {
        Self::with_slot(None, None)
    }

    /// Puts a value into the slot.
    pub(crate) fn put(&self, value: T) {
        self.lock().value = Some(value);
    }

    /// Takes the slot value.
    pub(crate) fn take(&self) -> Option<T> {
        self.lock().value.take()
    }

    pub(crate) fn has_value(&self) -> bool {
        self.lock().value.is_some()
    }

    /// Binds the waiter to one select call: commit token, operation index,
    /// shared completion signal. Receive slots are cleared; send slots keep
    /// their outgoing value.
    pub(crate) fn bind(
        &self,
        token: &Arc<CommitToken>,
        index: usize,
        signal: &Arc<Signal>,
        clear_slot: bool,
    ) {
        let mut state = self.lock();
        state.token = Some(token.clone());
        state.index = index;
        state.signal = Some(signal.clone());
        if clear_slot {
            state.value = None;
        }
    }

    /// Detaches the waiter from any select machinery for a non-parking pass.
    pub(crate) fn unbind(&self, clear_slot: bool) {
        let mut state = self.lock();
        state.token = None;
        state.index = 0;
        state.signal = None;
        if clear_slot {
            state.value = None;
        }
    }

    /// Commits this waiter. Waiters outside a select always commit; select
    /// waiters commit only while their token is unclaimed.
    pub(crate) fn claim(&self) -> bool {
        let state = self.lock();
        match &state.token {
            None => true,
            Some(token) => token.try_claim(state.index),
        }
    }

    /// True while the waiter could still commit. Waiters bound to `exclude`
    /// do not count: a select never rendezvouses with its own operations.
    pub(crate) fn is_live(&self, exclude: Option<&Arc<CommitToken>>) -> bool {
        let state = self.lock();
        match &state.token {
            None => true,
            Some(token) => {
                if let Some(own) = exclude {
                    if Arc::ptr_eq(token, own) {
                        return false;
                    }
                }
                !token.is_claimed()
            }
        }
    }

    /// Fires the completion signal.
    pub(crate) fn complete(&self) {
        let signal = self.lock().signal.clone();
        if let Some(signal) = signal {
            signal.notify();
        }
    }

    /// Parks until the completion signal fires.
    pub(crate) fn wait(&self) {
        let signal = self
            .lock()
            .signal
            .clone()
            .expect("parked waiter has no completion signal");
        signal.wait();
    }
}

/// FIFO of parked waiters. Unsynchronized; callers hold the owning channel's
/// lock.
pub(crate) struct WaiterQueue<T> {
    waiters: VecDeque<Arc<Waiter<T>>>,
}

impl<T> WaiterQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    pub(crate) fn enqueue(&mut self, waiter: Arc<Waiter<T>>) {
        self.waiters.push_back(waiter);
    }

    /// Pops the longest-parked waiter that still commits. Waiters whose
    /// select already committed elsewhere are discarded on the way.
    pub(crate) fn dequeue(&mut self) -> Option<Arc<Waiter<T>>> {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.claim() {
                return Some(waiter);
            }
        }
        None
    }

    /// Unlinks `waiter` by pointer identity, if still queued.
    pub(crate) fn remove(&mut self, waiter: &Arc<Waiter<T>>) {
        self.waiters.retain(|queued| !Arc::ptr_eq(queued, waiter));
    }

    /// True when some queued waiter could still commit to a rendezvous,
    /// excluding waiters bound to `exclude`.
    pub(crate) fn has_live(&self, exclude: Option<&Arc<CommitToken>>) -> bool {
        self.waiters.iter().any(|waiter| waiter.is_live(exclude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_claims_exactly_once() {
        let token = CommitToken::new();
        assert!(!token.is_claimed());
        assert!(token.try_claim(3));
        assert!(!token.try_claim(4));
        assert!(!token.try_abort());
        assert!(token.is_claimed());
        assert_eq!(token.winner(), Some(3));
    }

    #[test]
    fn aborted_token_has_no_winner() {
        let token = CommitToken::new();
        assert!(token.try_abort());
        assert!(!token.try_claim(0));
        assert!(token.is_claimed());
        assert_eq!(token.winner(), None);
    }

    #[test]
    fn dequeue_skips_committed_waiters() {
        let token = Arc::new(CommitToken::new());
        let signal = Arc::new(Signal::new());

        let stale: Arc<Waiter<u32>> = Waiter::detached();
        stale.bind(&token, 0, &signal, true);
        assert!(token.try_claim(7));

        let fresh: Arc<Waiter<u32>> = Waiter::receiver();

        let mut queue = WaiterQueue::new();
        queue.enqueue(stale);
        queue.enqueue(fresh.clone());

        let popped = queue.dequeue().unwrap();
        assert!(Arc::ptr_eq(&popped, &fresh));
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn remove_unlinks_by_identity() {
        let first: Arc<Waiter<u32>> = Waiter::receiver();
        let second: Arc<Waiter<u32>> = Waiter::receiver();

        let mut queue = WaiterQueue::new();
        queue.enqueue(first.clone());
        queue.enqueue(second.clone());

        queue.remove(&first);
        let popped = queue.dequeue().unwrap();
        assert!(Arc::ptr_eq(&popped, &second));
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn own_select_waiters_are_not_live_counterparts() {
        let token = Arc::new(CommitToken::new());
        let signal = Arc::new(Signal::new());

        let own: Arc<Waiter<u32>> = Waiter::detached();
        own.bind(&token, 1, &signal, true);

        let mut queue = WaiterQueue::new();
        queue.enqueue(own);

        assert!(!queue.has_live(Some(&token)));
        assert!(queue.has_live(None));
    }
}
