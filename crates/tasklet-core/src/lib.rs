//! # tasklet-core
//!
//! Shared contracts for the cooperative-scheduling fragment of the stream-processing
//! engine: watermarks, progress accounting, and the inbound/outbound stream traits that
//! `tasklet-tail` and `tasklet-watermark` build on.
//!
//! Nothing here talks to the filesystem or to a scheduler; it is the abstract seam both
//! concrete components are plugged into.

pub mod outbox;
pub mod processor;
pub mod progress;
pub mod stream;
pub mod watermark;

pub use outbox::{Emitted, Outbox, OutboundStream, VecOutbox, VecOutboundStream};
pub use processor::{Processor, ProcessorContext};
pub use progress::ProgressState;
pub use stream::{InboundStream, Peek, TestInboundStream};
pub use watermark::Watermark;
