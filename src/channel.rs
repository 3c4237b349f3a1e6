use std::sync::{Arc, Mutex};

use crate::error::SendError;
use crate::ring::RingBuffer;
use crate::waiter::{CommitToken, Waiter, WaiterQueue};

/// Outcome of registering a select waiter with a channel.
pub(crate) enum Registered {
    /// The call's token was claimed and the operation finished under the
    /// channel lock.
    Completed,
    /// The call's token was claimed; the channel is closed. A receive slot
    /// stays empty, a send slot keeps its value.
    Closed,
    /// A rendezvous with a foreign parked waiter is possible. Nothing was
    /// claimed or queued; the caller must abort its token and retry.
    Ready,
    /// The call's token was already claimed through another channel.
    Committed,
    /// The waiter was appended to a wait queue.
    Parked,
}

struct State<T> {
    buffer: RingBuffer<T>,
    senders: WaiterQueue<T>,
    receivers: WaiterQueue<T>,
    closed: bool,
}

/// A Go-style channel: a typed, bounded FIFO with blocking send and receive.
///
/// A capacity of zero makes the channel unbuffered: every send rendezvouses
/// with a receive. Cloning the handle shares the same channel; any clone may
/// send, receive, or close, from any thread.
///
/// # Example
///
/// ```
/// use bosfor::Channel;
/// use std::thread;
///
/// let ch: Channel<i32> = Channel::new();
/// let tx = ch.clone();
/// thread::spawn(move || {
///     tx.send(7).unwrap();
/// });
/// assert_eq!(ch.recv(), Some(7));
/// ```
pub struct Channel<T: 'static> {
    inner: Arc<Mutex<State<T>>>,
}

impl<T: 'static> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Channel<T> {
    /// Creates an unbuffered channel.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a buffered channel holding up to `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                buffer: RingBuffer::new(capacity),
                senders: WaiterQueue::new(),
                receivers: WaiterQueue::new(),
                closed: false,
            })),
        }
    }

    /// Sends a value, blocking while the channel is full.
    ///
    /// Fails only on a closed channel; the value travels back in the error.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let waiter;
        {
            let mut state = self.inner.lock().unwrap();
            if state.closed {
                return Err(SendError(value));
            }
            if state.buffer.is_empty() {
                if let Some(receiver) = state.receivers.dequeue() {
                    receiver.put(value);
                    receiver.complete();
                    return Ok(());
                }
            }
            if !state.buffer.is_full() {
                state.buffer.enqueue(value);
                return Ok(());
            }
            waiter = Waiter::sender(value);
            state.senders.enqueue(waiter.clone());
        }
        waiter.wait();
        Ok(())
    }

    /// Non-blocking send. Returns the value back when the channel is full or
    /// closed.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return Err(value);
        }
        if state.buffer.is_empty() {
            if let Some(receiver) = state.receivers.dequeue() {
                receiver.put(value);
                receiver.complete();
                return Ok(());
            }
        }
        if !state.buffer.is_full() {
            state.buffer.enqueue(value);
            return Ok(());
        }
        Err(value)
    }

    /// Receives a value, blocking while the channel is empty.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub fn recv(&self) -> Option<T> {
        let waiter;
        {
            let mut state = self.inner.lock().unwrap();
            if let Some(value) = state.buffer.dequeue() {
                Self::refill(&mut state);
                return Some(value);
            }
            if let Some(sender) = state.senders.dequeue() {
                let value = sender.take().expect("parked sender has no value");
                sender.complete();
                return Some(value);
            }
            if state.closed {
                return None;
            }
            waiter = Waiter::receiver();
            state.receivers.enqueue(waiter.clone());
        }
        waiter.wait();
        waiter.take()
    }

    /// Non-blocking receive. `None` when nothing is immediately available.
    pub fn try_recv(&self) -> Option<T> {
        let mut state = self.inner.lock().unwrap();
        if let Some(value) = state.buffer.dequeue() {
            Self::refill(&mut state);
            return Some(value);
        }
        if let Some(sender) = state.senders.dequeue() {
            let value = sender.take().expect("parked sender has no value");
            sender.complete();
            return Some(value);
        }
        None
    }

    /// Closes the channel. Subsequent sends fail; receives drain buffered and
    /// parked values in order, then return `None`. Idempotent.
    ///
    /// Senders already parked are not failed: their values stay receivable
    /// and they complete once drained.
    pub fn close(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        // Stale select waiters in the sender queue are not senders; only a
        // waiter that can still commit keeps receivers parked.
        if state.buffer.is_empty() && !state.senders.has_live(None) {
            while let Some(receiver) = state.receivers.dequeue() {
                receiver.complete();
            }
        }
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().buffer.len()
    }

    /// True when no values are buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().buffer.is_empty()
    }

    /// True when the buffer is at capacity. Always true for an unbuffered
    /// channel.
    pub fn is_full(&self) -> bool {
        self.inner.lock().unwrap().buffer.is_full()
    }

    /// Buffer capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().buffer.capacity()
    }

    /// Blocking iterator over received values; ends once the channel is
    /// closed and drained.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { channel: self }
    }

    /// Moves the longest-parked sender's value into freed buffer space.
    fn refill(state: &mut State<T>) {
        if let Some(sender) = state.senders.dequeue() {
            let value = sender.take().expect("parked sender has no value");
            state.buffer.enqueue(value);
            sender.complete();
        }
    }
}

// Select participation. Only `Select` drives these; they operate on the
// select's own per-operation waiters.
impl<T: 'static> Channel<T> {
    /// Non-blocking fast path for a select receive; fills the waiter's slot
    /// on success. A closed, drained channel counts as completed with an
    /// empty slot.
    pub(crate) fn try_register_recv(&self, waiter: &Arc<Waiter<T>>) -> bool {
        let mut state = self.inner.lock().unwrap();
        if let Some(value) = state.buffer.dequeue() {
            Self::refill(&mut state);
            waiter.put(value);
            return true;
        }
        if let Some(sender) = state.senders.dequeue() {
            let value = sender.take().expect("parked sender has no value");
            sender.complete();
            waiter.put(value);
            return true;
        }
        state.closed
    }

    /// Non-blocking fast path for a select send; drains the waiter's slot on
    /// delivery. A closed channel counts as completed with the value left in
    /// place.
    pub(crate) fn try_register_send(&self, waiter: &Arc<Waiter<T>>) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return true;
        }
        if state.buffer.is_empty() {
            if let Some(receiver) = state.receivers.dequeue() {
                let value = waiter.take().expect("send operation has no value");
                receiver.put(value);
                receiver.complete();
                return true;
            }
        }
        if !state.buffer.is_full() {
            let value = waiter.take().expect("send operation has no value");
            state.buffer.enqueue(value);
            return true;
        }
        false
    }

    /// Registration for a blocking select pass.
    ///
    /// Self-contained completions (buffered value, closed channel) claim the
    /// call's token before touching channel state. A possible rendezvous with
    /// a foreign parked waiter is reported as `Ready` without side effects,
    /// so the select can abort its token and retry through the non-parking
    /// fast path.
    pub(crate) fn register_recv(
        &self,
        waiter: &Arc<Waiter<T>>,
        token: &Arc<CommitToken>,
    ) -> Registered {
        let mut state = self.inner.lock().unwrap();
        if state.buffer.peek().is_some() {
            if !waiter.claim() {
                return Registered::Committed;
            }
            let value = state.buffer.dequeue().expect("ring buffer empty after peek");
            Self::refill(&mut state);
            waiter.put(value);
            return Registered::Completed;
        }
        if state.senders.has_live(Some(token)) {
            return Registered::Ready;
        }
        if state.closed {
            if waiter.claim() {
                Registered::Closed
            } else {
                Registered::Committed
            }
        } else {
            state.receivers.enqueue(waiter.clone());
            Registered::Parked
        }
    }

    pub(crate) fn register_send(
        &self,
        waiter: &Arc<Waiter<T>>,
        token: &Arc<CommitToken>,
    ) -> Registered {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return if waiter.claim() {
                Registered::Closed
            } else {
                Registered::Committed
            };
        }
        if state.buffer.is_empty() && state.receivers.has_live(Some(token)) {
            return Registered::Ready;
        }
        if !state.buffer.is_full() {
            if !waiter.claim() {
                return Registered::Committed;
            }
            let value = waiter.take().expect("send operation has no value");
            state.buffer.enqueue(value);
            return Registered::Completed;
        }
        state.senders.enqueue(waiter.clone());
        Registered::Parked
    }

    /// Drops a losing select waiter from whichever queue still holds it.
    pub(crate) fn remove_waiter(&self, waiter: &Arc<Waiter<T>>) {
        let mut state = self.inner.lock().unwrap();
        state.senders.remove(waiter);
        state.receivers.remove(waiter);
    }
}

/// Blocking iterator returned by [`Channel::iter`].
pub struct Iter<'a, T: 'static> {
    channel: &'a Channel<T>,
}

impl<T: 'static> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.channel.recv()
    }
}

impl<'a, T: 'static> IntoIterator for &'a Channel<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owning blocking iterator over a channel.
pub struct IntoIter<T: 'static> {
    channel: Channel<T>,
}

impl<T: 'static> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.channel.recv()
    }
}

impl<T: 'static> IntoIterator for Channel<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { channel: self }
    }
}
