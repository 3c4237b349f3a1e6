use bosfor::Channel;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_buffered_send_recv() {
    let ch = Channel::with_capacity(3);
    ch.send(1).unwrap();
    ch.send(2).unwrap();
    ch.send(3).unwrap();

    assert_eq!(ch.try_recv(), Some(1));
    assert_eq!(ch.try_recv(), Some(2));
    assert_eq!(ch.try_recv(), Some(3));
    assert_eq!(ch.try_recv(), None);
}

#[test]
fn test_try_send_overflow() {
    let ch = Channel::with_capacity(1);
    assert!(ch.try_send(true).is_ok());
    assert!(ch.try_send(true).is_err());
    assert_eq!(ch.recv(), Some(true));
    assert!(ch.try_send(true).is_ok());
}

#[test]
fn test_try_send_returns_the_value() {
    let ch = Channel::with_capacity(1);
    ch.send("first").unwrap();
    assert_eq!(ch.try_send("second"), Err("second"));
}

#[test]
fn test_observers() {
    let ch: Channel<u8> = Channel::with_capacity(2);
    assert_eq!(ch.capacity(), 2);
    assert_eq!(ch.len(), 0);
    assert!(ch.is_empty());
    assert!(!ch.is_full());

    ch.send(1).unwrap();
    ch.send(2).unwrap();
    assert_eq!(ch.len(), 2);
    assert!(ch.is_full());

    let unbuffered: Channel<u8> = Channel::new();
    assert_eq!(unbuffered.capacity(), 0);
    assert!(unbuffered.is_empty());
    assert!(unbuffered.is_full());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_unbuffered_handoff_blocks_sender() {
    let ch: Channel<i32> = Channel::new();
    let rx = ch.clone();

    let receiver = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        rx.recv()
    });

    let start = Instant::now();
    ch.send(7).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));

    assert_eq!(receiver.join().unwrap(), Some(7));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_unbuffered_handoff_blocks_receiver() {
    let ch: Channel<i32> = Channel::new();
    let tx = ch.clone();

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        tx.send(9).unwrap();
    });

    let start = Instant::now();
    assert_eq!(ch.recv(), Some(9));
    assert!(start.elapsed() >= Duration::from_millis(100));

    sender.join().unwrap();
}

#[test]
fn test_buffered_send_does_not_block_below_capacity() {
    let ch = Channel::with_capacity(2);
    ch.send(1).unwrap();
    ch.send(2).unwrap();
    assert_eq!(ch.recv(), Some(1));
    assert_eq!(ch.recv(), Some(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_buffered_send_blocks_at_capacity() {
    let ch = Channel::with_capacity(1);
    ch.send(1).unwrap();

    let tx = ch.clone();
    let sender = thread::spawn(move || {
        tx.send(2).unwrap();
    });

    // Give the sender time to park on the full buffer.
    thread::sleep(Duration::from_millis(50));

    assert_eq!(ch.recv(), Some(1));
    sender.join().unwrap();
    assert_eq!(ch.recv(), Some(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_fifo_order_through_parked_senders() {
    let ch = Channel::with_capacity(2);
    let tx = ch.clone();

    let sender = thread::spawn(move || {
        for i in 0..100 {
            tx.send(i).unwrap();
        }
    });

    let mut received = Vec::new();
    for _ in 0..100 {
        received.push(ch.recv().unwrap());
    }
    sender.join().unwrap();

    for (i, &value) in received.iter().enumerate() {
        assert_eq!(value, i);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_multiple_senders() {
    let ch = Channel::with_capacity(10);
    let mut handles = vec![];

    for t in 0..4 {
        let tx = ch.clone();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                tx.send(t * 100 + i).unwrap();
            }
        }));
    }

    let mut received = Vec::new();
    for _ in 0..400 {
        received.push(ch.recv().unwrap());
    }

    for h in handles {
        h.join().unwrap();
    }

    received.sort();
    assert_eq!(received.len(), 400);
    for (i, &value) in received.iter().enumerate() {
        assert_eq!(value, i);
    }
}

#[test]
fn test_iterator_ends_after_close() {
    let ch = Channel::with_capacity(4);
    for i in 0..4 {
        ch.send(i).unwrap();
    }
    ch.close();

    let received: Vec<_> = ch.iter().collect();
    assert_eq!(received, vec![0, 1, 2, 3]);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_for_loop_over_channel() {
    let ch: Channel<u32> = Channel::new();
    let tx = ch.clone();

    let sender = thread::spawn(move || {
        for i in 0..10 {
            tx.send(i).unwrap();
        }
        tx.close();
    });

    let mut sum = 0;
    for value in &ch {
        sum += value;
    }
    sender.join().unwrap();
    assert_eq!(sum, 45);
}
