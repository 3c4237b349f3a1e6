use std::sync::Arc;

use crossbeam_utils::Backoff;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::channel::{Channel, Registered};
use crate::error::SelectError;
use crate::signal::Signal;
use crate::waiter::{CommitToken, Waiter};

/// One registered operation, behind a non-generic protocol so channels of
/// different element types mix in a single select.
trait Operation: Send {
    /// True when the operation can participate: receives always, sends only
    /// while their slot holds a value.
    fn is_armed(&self) -> bool;
    /// Detaches the waiter for a non-parking pass.
    fn unbind(&self);
    /// Binds the waiter to the call's token, index, and completion signal.
    fn bind(&self, token: &Arc<CommitToken>, index: usize, signal: &Arc<Signal>);
    /// Non-blocking fast path.
    fn try_complete(&self) -> bool;
    /// Registration for the blocking pass.
    fn register(&self, token: &Arc<CommitToken>) -> Registered;
    /// Unlinks the waiter from the channel's wait queues.
    fn remove_waiter(&self);
}

struct RecvOp<T: 'static> {
    channel: Channel<T>,
    waiter: Arc<Waiter<T>>,
}

impl<T: Send + 'static> Operation for RecvOp<T> {
    fn is_armed(&self) -> bool {
        true
    }

    fn unbind(&self) {
        self.waiter.unbind(true);
    }

    fn bind(&self, token: &Arc<CommitToken>, index: usize, signal: &Arc<Signal>) {
        self.waiter.bind(token, index, signal, true);
    }

    fn try_complete(&self) -> bool {
        self.channel.try_register_recv(&self.waiter)
    }

    fn register(&self, token: &Arc<CommitToken>) -> Registered {
        self.channel.register_recv(&self.waiter, token)
    }

    fn remove_waiter(&self) {
        self.channel.remove_waiter(&self.waiter);
    }
}

struct SendOp<T: 'static> {
    channel: Channel<T>,
    waiter: Arc<Waiter<T>>,
}

impl<T: Send + 'static> Operation for SendOp<T> {
    fn is_armed(&self) -> bool {
        self.waiter.has_value()
    }

    fn unbind(&self) {
        self.waiter.unbind(false);
    }

    fn bind(&self, token: &Arc<CommitToken>, index: usize, signal: &Arc<Signal>) {
        self.waiter.bind(token, index, signal, false);
    }

    fn try_complete(&self) -> bool {
        self.channel.try_register_send(&self.waiter)
    }

    fn register(&self, token: &Arc<CommitToken>) -> Registered {
        self.channel.register_send(&self.waiter, token)
    }

    fn remove_waiter(&self) {
        self.channel.remove_waiter(&self.waiter);
    }
}

/// Typed accessor for a receive operation added to a [`Select`].
pub struct RecvHandle<T: 'static> {
    index: usize,
    waiter: Arc<Waiter<T>>,
}

impl<T: 'static> RecvHandle<T> {
    /// Index of this operation inside its select.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Takes the value delivered by the winning receive. `None` when the
    /// channel was closed.
    pub fn take(&self) -> Option<T> {
        self.waiter.take()
    }
}

/// Typed accessor for a send operation added to a [`Select`].
pub struct SendHandle<T: 'static> {
    index: usize,
    waiter: Arc<Waiter<T>>,
}

impl<T: 'static> SendHandle<T> {
    /// Index of this operation inside its select.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Re-arms the operation with a new outgoing value. A send operation
    /// whose slot is empty is skipped by subsequent calls.
    pub fn set(&self, value: T) {
        self.waiter.put(value);
    }

    /// Takes back an undelivered value: either the operation has not yet won
    /// a select, or it won because the channel was closed.
    pub fn take(&self) -> Option<T> {
        self.waiter.take()
    }
}

/// Multiplexer that performs exactly one send or receive across a set of
/// channels.
///
/// Operations are added up front; each `select` call then commits exactly one
/// of them, choosing uniformly at random among those simultaneously ready and
/// blocking until one becomes ready. A receive on a closed channel is
/// immediately ready and yields `None` through its handle.
///
/// # Example
///
/// ```
/// use bosfor::{Channel, Select};
///
/// let a: Channel<i32> = Channel::with_capacity(1);
/// let b: Channel<i32> = Channel::with_capacity(1);
/// a.send(1).unwrap();
///
/// let mut sel = Select::new();
/// let ra = sel.recv(&a);
/// let rb = sel.recv(&b);
///
/// let winner = sel.select().unwrap();
/// assert_eq!(winner, ra.index());
/// assert_eq!(ra.take(), Some(1));
/// # let _ = rb;
/// ```
pub struct Select {
    operations: Vec<Box<dyn Operation>>,
    cleared: Vec<bool>,
    poll_order: Vec<usize>,
}

impl Default for Select {
    fn default() -> Self {
        Self::new()
    }
}

impl Select {
    /// Creates a select with no operations.
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            cleared: Vec::new(),
            poll_order: Vec::new(),
        }
    }

    /// Adds a receive on `channel`; returns its typed handle.
    pub fn recv<T: Send + 'static>(&mut self, channel: &Channel<T>) -> RecvHandle<T> {
        let waiter = Waiter::detached();
        let index = self.push(Box::new(RecvOp {
            channel: channel.clone(),
            waiter: waiter.clone(),
        }));
        RecvHandle { index, waiter }
    }

    /// Adds a send of `value` on `channel`; returns its typed handle.
    pub fn send<T: Send + 'static>(&mut self, channel: &Channel<T>, value: T) -> SendHandle<T> {
        let waiter = Waiter::detached();
        waiter.put(value);
        let index = self.push(Box::new(SendOp {
            channel: channel.clone(),
            waiter: waiter.clone(),
        }));
        SendHandle { index, waiter }
    }

    /// Marks operation `index` inactive for subsequent calls, the analogue of
    /// a nil channel in a Go select.
    ///
    /// # Panics
    ///
    /// Panics when `index` does not name an added operation.
    pub fn clear(&mut self, index: usize) {
        self.cleared[index] = true;
    }

    /// Blocks until exactly one operation completes; returns its index.
    ///
    /// A receive's value (or `None` for a closed channel) is read through its
    /// [`RecvHandle`]; a value left unread is discarded by the next call.
    pub fn select(&mut self) -> Result<usize, SelectError> {
        if !self.has_active() {
            return Err(SelectError::AllCleared);
        }

        enum Pass {
            AllParked,
            Won(usize),
            Foreign,
            Retry,
        }

        let backoff = Backoff::new();
        let mut parked: Vec<usize> = Vec::with_capacity(self.operations.len());
        loop {
            if let Some(index) = self.try_pass() {
                return Ok(index);
            }

            let token = Arc::new(CommitToken::new());
            let signal = Arc::new(Signal::new());
            parked.clear();
            let mut outcome = Pass::AllParked;

            for slot in 0..self.poll_order.len() {
                let index = self.poll_order[slot];
                if !self.active(index) {
                    continue;
                }
                let operation = &self.operations[index];
                operation.bind(&token, index, &signal);
                match operation.register(&token) {
                    Registered::Completed | Registered::Closed => {
                        outcome = Pass::Won(index);
                        break;
                    }
                    Registered::Committed => {
                        outcome = Pass::Foreign;
                        break;
                    }
                    Registered::Ready => {
                        outcome = if token.try_abort() {
                            Pass::Retry
                        } else {
                            Pass::Foreign
                        };
                        break;
                    }
                    Registered::Parked => parked.push(index),
                }
            }

            match outcome {
                Pass::Won(index) => {
                    self.unpark(&parked, None);
                    return Ok(index);
                }
                Pass::Retry => {
                    self.unpark(&parked, None);
                    backoff.snooze();
                }
                // Every active operation vanished between the readiness check
                // and registration (a handle drained a send slot): nothing is
                // parked and nothing can fire the signal.
                Pass::AllParked if parked.is_empty() => {
                    return Err(SelectError::AllCleared);
                }
                Pass::Foreign | Pass::AllParked => {
                    signal.wait();
                    let winner = token
                        .winner()
                        .expect("completion signal fired without a committed operation");
                    self.unpark(&parked, Some(winner));
                    return Ok(winner);
                }
            }
        }
    }

    /// Non-blocking select. `Ok(None)` when no operation is ready.
    pub fn try_select(&mut self) -> Result<Option<usize>, SelectError> {
        if !self.has_active() {
            return Err(SelectError::AllCleared);
        }
        Ok(self.try_pass())
    }

    fn push(&mut self, operation: Box<dyn Operation>) -> usize {
        let index = self.operations.len();
        self.operations.push(operation);
        self.cleared.push(false);
        self.poll_order.push(index);
        index
    }

    fn active(&self, index: usize) -> bool {
        !self.cleared[index] && self.operations[index].is_armed()
    }

    fn has_active(&self) -> bool {
        (0..self.operations.len()).any(|index| self.active(index))
    }

    /// One shuffled pass of non-parking fast paths. Nothing is parked while
    /// it runs, so completions involve at most the counterpart's token.
    fn try_pass(&mut self) -> Option<usize> {
        self.poll_order.shuffle(&mut thread_rng());
        for slot in 0..self.poll_order.len() {
            let index = self.poll_order[slot];
            if !self.active(index) {
                continue;
            }
            let operation = &self.operations[index];
            operation.unbind();
            if operation.try_complete() {
                return Some(index);
            }
        }
        None
    }

    /// Removes still-parked losers from their channels' queues.
    fn unpark(&self, parked: &[usize], winner: Option<usize>) {
        for &index in parked {
            if Some(index) == winner {
                continue;
            }
            self.operations[index].remove_waiter();
        }
    }
}
