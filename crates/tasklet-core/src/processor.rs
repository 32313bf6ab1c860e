//! The user-processor contract driven by [`crate::progress::ProgressState`]-returning
//! callers (a `WatermarkingTasklet` in `tasklet-watermark`, or a test harness).

use crate::outbox::OutboundStream;
use crate::stream::InboundStream;
use crate::watermark::Watermark;

/// Static context handed to a processor once, at `init`.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    pub vertex_name: String,
    pub global_processor_index: usize,
}

/// The processor a [`crate::watermark::Watermark`]-merging tasklet drives.
///
/// All methods take the full set of outbound edges rather than a single sink: a
/// processor with several downstream edges decides for itself which ordinal(s) to
/// offer to. The driving tasklet never calls [`OutboundStream::offer_watermark`]
/// through these parameters on the processor's behalf inside `process`/`try_process`;
/// it only does so itself after `try_process_watermark` returns `true` (see
/// `tasklet-watermark`).
pub trait Processor<T> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once before any other method.
    fn init(
        &mut self,
        _outbound: &mut [Box<dyn OutboundStream<T>>],
        _context: &ProcessorContext,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Drain or partially drain the given inbox. Returns whether at least one item was
    /// removed from `inbox`. Items left in `inbox` are re-presented on the next call.
    fn process(
        &mut self,
        ordinal: usize,
        inbox: &mut dyn InboundStream<T>,
        outbound: &mut [Box<dyn OutboundStream<T>>],
    ) -> Result<bool, Self::Error>;

    /// Attempt to fully absorb `watermark`. May write items to `outbound`. Must be
    /// re-invoked with the same `watermark` until it returns `true`.
    fn try_process_watermark(
        &mut self,
        watermark: Watermark,
        outbound: &mut [Box<dyn OutboundStream<T>>],
    ) -> Result<bool, Self::Error>;

    /// Optional idle hook, invoked when no inbound stream had an item this step. The
    /// return value is advisory progress only.
    fn try_process(
        &mut self,
        _outbound: &mut [Box<dyn OutboundStream<T>>],
    ) -> Result<bool, Self::Error> {
        Ok(false)
    }

    /// Whether the processor considers itself fully drained.
    fn complete(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
