//! Bounded FIFO queues between pipeline stages.
//!
//! Thin wrapper over [`crossbeam_channel`] bounded channels, pinning the
//! contract the stages rely on:
//!
//! - `put` blocks while the queue is full (back-pressure), and reports
//!   [`Closed`] once the consumer is gone — the producer's signal to stop.
//! - `get` blocks while the queue is empty, drains remaining items after
//!   the producer closes, then reports end-of-stream.
//! - Insertion order is preserved.
//!
//! Closing happens when the producer side is dropped, so a stage that exits
//! for any reason (done, failed, cancelled) closes its output exactly once.

use crossbeam_channel::{Receiver, Sender};

/// Capacity used for both inter-stage queues.
pub const DEFAULT_CAPACITY: usize = 1024;

/// The consuming side of the queue is gone; no more items can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Create a bounded queue with the given capacity.
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producing end. Dropping it closes the queue.
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: Sender<T>,
}

impl<T> QueueSender<T> {
    /// Blocking insert. Returns [`Closed`] when the receiver is gone,
    /// which producers treat as downstream cancellation.
    pub fn put(&self, item: T) -> Result<(), Closed> {
        self.tx.send(item).map_err(|_| Closed)
    }

    /// Close the queue explicitly. Equivalent to dropping the sender.
    pub fn close(self) {}
}

/// Consuming end.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
}

impl<T> QueueReceiver<T> {
    /// Blocking removal. Returns `None` once the queue is closed *and*
    /// drained.
    pub fn get(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

impl<T> IntoIterator for QueueReceiver<T> {
    type Item = T;
    type IntoIter = crossbeam_channel::IntoIter<T>;

    /// Iterate until the queue is closed and drained.
    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn preserves_insertion_order() {
        let (tx, rx) = bounded(8);
        for i in 0..5 {
            tx.put(i).unwrap();
        }
        tx.close();
        let drained: Vec<i32> = rx.into_iter().collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn get_drains_then_reports_closed() {
        let (tx, rx) = bounded(4);
        tx.put(1).unwrap();
        tx.put(2).unwrap();
        tx.close();
        assert_eq!(rx.get(), Some(1));
        assert_eq!(rx.get(), Some(2));
        assert_eq!(rx.get(), None);
        assert_eq!(rx.get(), None, "closed queue stays closed");
    }

    #[test]
    fn put_after_receiver_dropped_reports_closed() {
        let (tx, rx) = bounded::<u32>(4);
        drop(rx);
        assert_eq!(tx.put(7), Err(Closed));
    }

    #[test]
    fn full_queue_blocks_until_consumed() {
        let (tx, rx) = bounded(1);
        let producer = thread::spawn(move || {
            for i in 0..3 {
                tx.put(i).unwrap();
            }
        });
        // Let the producer hit the capacity limit before draining.
        thread::sleep(Duration::from_millis(50));
        let drained: Vec<i32> = rx.into_iter().collect();
        producer.join().unwrap();
        assert_eq!(drained, vec![0, 1, 2]);
    }
}
