//! Go-style rendezvous channels for thread-to-thread communication.
//!
//! This crate provides a typed, bounded (optionally zero-capacity) channel
//! with blocking and non-blocking send and receive, close semantics matching
//! Go's, and a [`Select`] multiplexer that performs exactly one operation
//! across a set of channels.
//!
//! # Key features
//!
//! - **Rendezvous**: a zero-capacity [`Channel`] hands every value directly
//!   from a sender to a receiver; buffered channels decouple them up to a
//!   fixed capacity.
//! - **Close semantics**: after [`Channel::close`], sends fail, receives
//!   drain remaining values in order and then return `None` forever.
//! - **Select**: [`Select`] blocks until one of its operations is ready and
//!   commits exactly one, choosing at random among those simultaneously
//!   ready.
//! - **Iteration**: a channel is a lazy finite sequence; `for v in &ch`
//!   terminates once the channel is closed and drained.
//! - **Timers**: [`after`] returns a channel that delivers a single
//!   timestamp, for composing deadlines into a select.
//!
//! # Example
//!
//! ```
//! use bosfor::{Channel, Select};
//! use std::thread;
//!
//! let jobs: Channel<u32> = Channel::with_capacity(2);
//! let done: Channel<&str> = Channel::new();
//!
//! let worker_jobs = jobs.clone();
//! let worker_done = done.clone();
//! thread::spawn(move || {
//!     for _job in &worker_jobs {}
//!     worker_done.send("drained").unwrap();
//! });
//!
//! jobs.send(1).unwrap();
//! jobs.send(2).unwrap();
//! jobs.close();
//!
//! let mut sel = Select::new();
//! let finished = sel.recv(&done);
//! let winner = sel.select().unwrap();
//! assert_eq!(winner, finished.index());
//! assert_eq!(finished.take(), Some("drained"));
//! ```

#![warn(missing_docs)]

mod after;
mod channel;
mod error;
mod ring;
mod select;
mod signal;
mod waiter;

pub use after::after;
pub use channel::{Channel, IntoIter, Iter};
pub use error::{SelectError, SendError};
pub use select::{RecvHandle, Select, SendHandle};
