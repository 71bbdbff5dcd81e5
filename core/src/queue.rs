//! Fixed-capacity, single-producer/single-consumer message queue.
//!
//! A ring buffer of 8 slots, each holding at most [`MAX_MESSAGE_BYTES`].
//! The producer (a transport callback, potentially reentrant from within
//! `handle()`) and the consumer (the main loop draining `handle()`) are
//! serialized by a `Mutex` rather than a lock-free head/tail scheme — the
//! queue is low-frequency and small, so a mutex is the simplest tool that
//! satisfies "concurrent push and pop never corrupt indices or contents".

use crate::error::{OverflowKind, SdkError};
use std::sync::Mutex;

pub const QUEUE_CAPACITY: usize = 8;
pub const MAX_MESSAGE_BYTES: usize = 2048;

/// Which logical channel a queued message belongs to. The core only ever
/// has one transport, but tagging slots keeps the queue generic the way
/// the original SDK's queue (shared by WebSocket and, in later revisions,
/// MQTT) was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    WebSocket,
}

#[derive(Debug, Clone)]
struct Slot {
    interface: Interface,
    bytes: Vec<u8>,
}

struct Inner {
    slots: [Option<Slot>; QUEUE_CAPACITY],
    head: usize,
    tail: usize,
    count: usize,
}

impl Inner {
    fn new() -> Self {
        Self {
            slots: Default::default(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }
}

/// Bounded FIFO ring buffer. `push` never blocks and never corrupts state
/// on overflow; it simply reports failure.
pub struct MessageQueue {
    inner: Mutex<Inner>,
}

impl MessageQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Pushes `bytes` tagged with `interface`. Fails with
    /// [`OverflowKind::MessageTooLarge`] if `bytes` exceeds
    /// [`MAX_MESSAGE_BYTES`], or [`OverflowKind::QueueFull`] if the queue
    /// already holds [`QUEUE_CAPACITY`] messages. Never truncates.
    pub fn push(&self, interface: Interface, bytes: &[u8]) -> Result<(), SdkError> {
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(SdkError::Overflow(OverflowKind::MessageTooLarge {
                len: bytes.len(),
                max: MAX_MESSAGE_BYTES,
            }));
        }
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.count == QUEUE_CAPACITY {
            return Err(SdkError::Overflow(OverflowKind::QueueFull));
        }
        let tail = inner.tail;
        inner.slots[tail] = Some(Slot {
            interface,
            bytes: bytes.to_vec(),
        });
        inner.tail = (inner.tail + 1) % QUEUE_CAPACITY;
        inner.count += 1;
        Ok(())
    }

    /// Destructive FIFO pop.
    pub fn pop(&self) -> Option<(Interface, Vec<u8>)> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.count == 0 {
            return None;
        }
        let head = inner.head;
        let slot = inner.slots[head].take()?;
        inner.head = (inner.head + 1) % QUEUE_CAPACITY;
        inner.count -= 1;
        Some((slot.interface, slot.bytes))
    }

    /// Non-destructive read of the next message, if any.
    #[must_use]
    pub fn peek(&self) -> Option<(Interface, Vec<u8>)> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.count == 0 {
            return None;
        }
        inner.slots[inner.head]
            .as_ref()
            .map(|slot| (slot.interface, slot.bytes.clone()))
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *inner = Inner::new();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == QUEUE_CAPACITY
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let queue = MessageQueue::new();
        for i in 0..QUEUE_CAPACITY {
            queue.push(Interface::WebSocket, &[i as u8]).unwrap();
        }
        for i in 0..QUEUE_CAPACITY {
            let (_, bytes) = queue.pop().unwrap();
            assert_eq!(bytes, vec![i as u8]);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn ninth_push_fails_and_leaves_queue_unchanged() {
        let queue = MessageQueue::new();
        for i in 0..QUEUE_CAPACITY {
            queue.push(Interface::WebSocket, &[i as u8]).unwrap();
        }
        assert!(queue.push(Interface::WebSocket, &[99]).is_err());
        assert_eq!(queue.len(), QUEUE_CAPACITY);
        let (_, first) = queue.pop().unwrap();
        assert_eq!(first, vec![0u8]);
    }

    #[test]
    fn oversize_message_rejected_without_truncation() {
        let queue = MessageQueue::new();
        let oversize = vec![0u8; MAX_MESSAGE_BYTES + 1];
        assert!(queue.push(Interface::WebSocket, &oversize).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn peek_does_not_consume() {
        let queue = MessageQueue::new();
        queue.push(Interface::WebSocket, b"hello").unwrap();
        assert_eq!(queue.peek().unwrap().1, b"hello");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().unwrap().1, b"hello");
    }

    #[test]
    fn wraps_around_ring_after_churn() {
        let queue = MessageQueue::new();
        for round in 0..3 {
            for i in 0..QUEUE_CAPACITY {
                queue.push(Interface::WebSocket, &[round, i as u8]).unwrap();
            }
            for i in 0..QUEUE_CAPACITY {
                assert_eq!(queue.pop().unwrap().1, vec![round, i as u8]);
            }
        }
    }
}
