use std::thread;
use std::time::{Duration, Instant};

use crate::channel::Channel;

/// Creates a channel that delivers one timestamp once `duration` has elapsed,
/// then closes.
///
/// The usual way to give a blocking [`Select`](crate::Select) a deadline:
/// add a receive on the returned channel next to the operations of interest.
pub fn after(duration: Duration) -> Channel<Instant> {
    let channel = Channel::with_capacity(1);
    let timer = channel.clone();
    thread::spawn(move || {
        thread::sleep(duration);
        let _ = timer.try_send(Instant::now());
        timer.close();
    });
    channel
}
