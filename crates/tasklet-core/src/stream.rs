//! Inbound-stream contract: an ordered sequence of data items, watermarks, and an
//! eventual end-of-stream marker, exposed through a peek/remove pair rather than a
//! consuming iterator so a processor can leave an item in place across calls.

use crate::watermark::Watermark;

/// What `peek` sees at the head of an inbound stream.
#[derive(Debug)]
pub enum Peek<'a, T> {
    /// A data item. Not yet removed; call [`InboundStream::remove`] to consume it.
    Item(&'a T),
    /// A watermark. Not yet removed.
    Watermark(Watermark),
    /// The stream will never produce another item.
    EndOfStream,
    /// Nothing is available right now; this is not the same as end-of-stream.
    Empty,
}

/// One ordered inbound edge into a tasklet.
///
/// Implementations must preserve, within a single stream, the relative order in which
/// data items and watermarks were produced. `peek` never advances the stream; only
/// `remove` does, and only the element last returned by `peek` is removed by it.
pub trait InboundStream<T> {
    /// Stable ordinal identifying this stream among its siblings.
    fn ordinal(&self) -> usize;

    /// Look at, without consuming, the next element.
    fn peek(&mut self) -> Peek<'_, T>;

    /// Consume the element last returned by [`InboundStream::peek`].
    ///
    /// Calling this without a preceding non-`Empty` peek is a logic error in the caller;
    /// implementations may simply no-op in that case.
    fn remove(&mut self);
}

/// An in-memory, `VecDeque`-backed inbound stream, for tests and for the demonstration
/// harness. Feed it with [`TestInboundStream::push_item`], [`TestInboundStream::push_watermark`],
/// and [`TestInboundStream::push_end_of_stream`].
#[derive(Debug)]
pub struct TestInboundStream<T> {
    ordinal: usize,
    events: std::collections::VecDeque<QueuedEvent<T>>,
}

#[derive(Debug)]
enum QueuedEvent<T> {
    Item(T),
    Watermark(Watermark),
    EndOfStream,
}

impl<T> TestInboundStream<T> {
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            events: std::collections::VecDeque::new(),
        }
    }

    pub fn push_item(&mut self, item: T) {
        self.events.push_back(QueuedEvent::Item(item));
    }

    pub fn push_watermark(&mut self, wm: impl Into<Watermark>) {
        self.events.push_back(QueuedEvent::Watermark(wm.into()));
    }

    pub fn push_end_of_stream(&mut self) {
        self.events.push_back(QueuedEvent::EndOfStream);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> InboundStream<T> for TestInboundStream<T> {
    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn peek(&mut self) -> Peek<'_, T> {
        match self.events.front() {
            Some(QueuedEvent::Item(item)) => Peek::Item(item),
            Some(QueuedEvent::Watermark(wm)) => Peek::Watermark(*wm),
            Some(QueuedEvent::EndOfStream) => Peek::EndOfStream,
            None => Peek::Empty,
        }
    }

    fn remove(&mut self) {
        self.events.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_advance_without_remove() {
        let mut stream = TestInboundStream::new(0);
        stream.push_item(42);

        assert!(matches!(stream.peek(), Peek::Item(&42)));
        assert!(matches!(stream.peek(), Peek::Item(&42)));

        stream.remove();
        assert!(matches!(stream.peek(), Peek::Empty));
    }

    #[test]
    fn preserves_insertion_order_of_mixed_events() {
        let mut stream: TestInboundStream<i32> = TestInboundStream::new(1);
        stream.push_item(1);
        stream.push_watermark(100);
        stream.push_item(2);
        stream.push_end_of_stream();

        assert!(matches!(stream.peek(), Peek::Item(&1)));
        stream.remove();
        assert!(matches!(stream.peek(), Peek::Watermark(w) if w.value() == 100));
        stream.remove();
        assert!(matches!(stream.peek(), Peek::Item(&2)));
        stream.remove();
        assert!(matches!(stream.peek(), Peek::EndOfStream));
    }
}
