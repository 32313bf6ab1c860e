//! Glue connecting a `FileTailSource`'s `Outbox<String>` to a `WatermarkingTasklet`'s
//! `InboundStream<String>`. The two subsystems are otherwise unaware of each other; this
//! module is the only place that holds both halves of the same queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tasklet_core::{InboundStream, Outbox, Peek};

struct SharedQueue<T> {
    queue: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

/// A bounded FIFO shared between a tail source (producer) and a tasklet (consumer).
/// `close` marks that the producer is done; once the inbound side has drained past that
/// point it reports `EndOfStream` instead of `Empty`.
pub struct QueueBridge<T> {
    inner: Rc<RefCell<SharedQueue<T>>>,
}

impl<T> QueueBridge<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SharedQueue {
                queue: VecDeque::new(),
                capacity,
                closed: false,
            })),
        }
    }

    /// A fresh handle for the producer side.
    pub fn outbox(&self) -> BridgeOutbox<T> {
        BridgeOutbox(self.inner.clone())
    }

    /// A fresh handle for the consumer side, at the given inbound ordinal.
    pub fn inbound(&self, ordinal: usize) -> BridgeInbound<T> {
        BridgeInbound {
            ordinal,
            inner: self.inner.clone(),
            current: None,
        }
    }

    pub fn close(&self) {
        self.inner.borrow_mut().closed = true;
    }
}

/// The producer-facing half: hands lines to the shared queue, refusing once `capacity`
/// is reached so the tail source retries the same line later.
pub struct BridgeOutbox<T>(Rc<RefCell<SharedQueue<T>>>);

impl<T> Outbox<T> for BridgeOutbox<T> {
    fn offer(&mut self, item: T) -> Result<(), T> {
        let mut state = self.0.borrow_mut();
        if state.queue.len() >= state.capacity {
            return Err(item);
        }
        state.queue.push_back(item);
        Ok(())
    }
}

/// The consumer-facing half: the inbound stream a demonstration tasklet reads lines
/// from. Never produces a watermark of its own; plain line tailing has none.
///
/// `peek` stages at most one popped item in `current` so it can hand back a reference
/// tied to `&mut self` instead of one borrowed out of the shared `RefCell`.
pub struct BridgeInbound<T> {
    ordinal: usize,
    inner: Rc<RefCell<SharedQueue<T>>>,
    current: Option<T>,
}

impl<T> InboundStream<T> for BridgeInbound<T> {
    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn peek(&mut self) -> Peek<'_, T> {
        if self.current.is_none() {
            self.current = self.inner.borrow_mut().queue.pop_front();
        }
        match &self.current {
            Some(item) => Peek::Item(item),
            None if self.inner.borrow().closed => Peek::EndOfStream,
            None => Peek::Empty,
        }
    }

    fn remove(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_offered_on_producer_side_is_peeked_on_consumer_side() {
        let bridge = QueueBridge::new(2);
        let mut outbox = bridge.outbox();
        let mut inbound = bridge.inbound(0);

        assert!(matches!(inbound.peek(), Peek::Empty));

        outbox.offer("line one".to_string()).unwrap();
        assert!(matches!(inbound.peek(), Peek::Item(item) if item == "line one"));
        inbound.remove();
        assert!(matches!(inbound.peek(), Peek::Empty));
    }

    #[test]
    fn offer_refuses_past_capacity_and_hands_item_back() {
        let bridge = QueueBridge::new(1);
        let mut outbox = bridge.outbox();

        outbox.offer("a".to_string()).unwrap();
        assert_eq!(outbox.offer("b".to_string()), Err("b".to_string()));
    }

    #[test]
    fn close_reports_end_of_stream_once_drained() {
        let bridge = QueueBridge::new(4);
        let mut outbox = bridge.outbox();
        let mut inbound = bridge.inbound(0);

        outbox.offer("only line".to_string()).unwrap();
        bridge.close();

        assert!(matches!(inbound.peek(), Peek::Item(_)));
        inbound.remove();
        assert!(matches!(inbound.peek(), Peek::EndOfStream));
    }
}
