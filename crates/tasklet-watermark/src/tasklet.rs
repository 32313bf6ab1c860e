//! The watermark-coordinating state machine itself.

use tasklet_config::log_watermark_debug;
use tasklet_core::{InboundStream, OutboundStream, Peek, Processor, ProcessorContext, ProgressState, Watermark};

use crate::WatermarkError;

/// Drives `processor` with items from `inbound`, merges watermarks according to
/// `max_watermark_retain_millis`, and forwards processed items and coalesced watermarks
/// to every stream in `outbound`.
///
/// `max_watermark_retain_millis < 0` means retain indefinitely: every inbound stream
/// must contribute (or finish) before a watermark is emitted. `>= 0` means a stream
/// silent for that many milliseconds is excluded from the coalesced minimum.
pub struct WatermarkingTasklet<T, P: Processor<T>> {
    processor: P,
    inbound: Vec<Box<dyn InboundStream<T>>>,
    outbound: Vec<Box<dyn OutboundStream<T>>>,
    context: ProcessorContext,
    max_watermark_retain_millis: i64,

    per_stream_watermark: Vec<Watermark>,
    last_observation_nanos: Vec<u64>,
    stream_done: Vec<bool>,
    next_ordinal: usize,

    last_emitted: Watermark,
    pending: Option<Watermark>,
    pending_absorbed: bool,
    emitted_mask: Vec<bool>,

    initialized: bool,
    done: bool,
}

impl<T, P: Processor<T>> WatermarkingTasklet<T, P> {
    pub fn new(
        processor: P,
        inbound: Vec<Box<dyn InboundStream<T>>>,
        outbound: Vec<Box<dyn OutboundStream<T>>>,
        context: ProcessorContext,
        max_watermark_retain_millis: i64,
    ) -> Self {
        let per_stream_watermark = vec![Watermark::MIN; inbound.len()];
        let stream_done = vec![false; inbound.len()];
        Self {
            processor,
            inbound,
            outbound,
            context,
            max_watermark_retain_millis,
            per_stream_watermark,
            last_observation_nanos: Vec::new(),
            stream_done,
            next_ordinal: 0,
            last_emitted: Watermark::MIN,
            pending: None,
            pending_absorbed: false,
            emitted_mask: Vec::new(),
            initialized: false,
            done: false,
        }
    }

    /// One cooperative step, driven by an external scheduler.
    pub fn call(&mut self, now_nanos: u64) -> Result<ProgressState, WatermarkError<P::Error>> {
        if self.done {
            return Ok(ProgressState::WasAlreadyDone);
        }

        if !self.initialized {
            self.last_observation_nanos = vec![now_nanos; self.inbound.len()];
            self.processor.init(&mut self.outbound, &self.context)?;
            self.initialized = true;
        }

        let mut made_progress = false;
        let had_item = self.intake(now_nanos, &mut made_progress)?;

        if !had_item {
            let advisory = self.processor.try_process(&mut self.outbound)?;
            made_progress |= advisory;
        }

        if self.pending.is_none() {
            if let Some(candidate) = self.compute_eligible_watermark(now_nanos) {
                if candidate > self.last_emitted {
                    log_watermark_debug!("new watermark eligible for emission", value = candidate.value());
                    self.pending = Some(candidate);
                    self.pending_absorbed = false;
                    self.emitted_mask = vec![false; self.outbound.len()];
                }
            }
        }

        self.drive_pending(&mut made_progress)?;

        if !self.inbound.is_empty() && self.stream_done.iter().all(|&done| done) && self.pending.is_none() {
            self.done = true;
            return Ok(ProgressState::Done);
        }

        Ok(ProgressState::from_made_progress(made_progress))
    }

    /// Round-robin: advance to the next non-done stream after `next_ordinal` and examine
    /// *only* its head, once. An empty head counts as "nothing this call" rather than
    /// falling through to try another stream — each stream's watermark observation time
    /// only advances on a call where it was actually the one examined, which is what the
    /// retention timer in `compute_eligible_watermark` keys off. Finished streams are
    /// skipped while picking the target, since visiting them can never yield anything.
    fn intake(&mut self, now_nanos: u64, made_progress: &mut bool) -> Result<bool, WatermarkError<P::Error>> {
        let n = self.inbound.len();
        if n == 0 {
            return Ok(false);
        }

        let mut ordinal = self.next_ordinal % n;
        let mut scanned = 0;
        while self.stream_done[ordinal] {
            scanned += 1;
            if scanned == n {
                return Ok(false);
            }
            ordinal = (ordinal + 1) % n;
        }
        self.next_ordinal = (ordinal + 1) % n;

        match self.inbound[ordinal].peek() {
            Peek::Empty => Ok(false),
            Peek::Item(_) => {
                let removed = self
                    .processor
                    .process(ordinal, self.inbound[ordinal].as_mut(), &mut self.outbound)?;
                *made_progress |= removed;
                Ok(true)
            }
            Peek::Watermark(w) => {
                self.inbound[ordinal].remove();
                if w > self.per_stream_watermark[ordinal] {
                    self.per_stream_watermark[ordinal] = w;
                }
                self.last_observation_nanos[ordinal] = now_nanos;
                *made_progress = true;
                Ok(true)
            }
            Peek::EndOfStream => {
                self.stream_done[ordinal] = true;
                *made_progress = true;
                Ok(true)
            }
        }
    }

    /// The minimum watermark across every inbound stream that is still "participating".
    /// A finished stream never participates again (it can only ever have contributed
    /// its last watermark, never a lower one); a stream that hasn't finished
    /// participates always under infinite retention, or if it has produced a watermark
    /// within the last `max_watermark_retain_millis` milliseconds.
    fn compute_eligible_watermark(&self, now_nanos: u64) -> Option<Watermark> {
        if self.inbound.is_empty() {
            return None;
        }

        let mut minimum: Option<Watermark> = None;
        let mut any_included = false;

        for i in 0..self.inbound.len() {
            if self.stream_done[i] {
                continue;
            }
            let included = if self.max_watermark_retain_millis < 0 {
                true
            } else {
                let retain_nanos = (self.max_watermark_retain_millis as u64).saturating_mul(1_000_000);
                let elapsed = now_nanos.saturating_sub(self.last_observation_nanos[i]);
                elapsed < retain_nanos
            };
            if !included {
                continue;
            }
            any_included = true;
            let w = self.per_stream_watermark[i];
            minimum = Some(match minimum {
                Some(current) if current < w => current,
                _ => w,
            });
        }

        if !any_included {
            return None;
        }
        match minimum {
            Some(w) if !w.is_min() => Some(w),
            _ => None,
        }
    }

    /// Drive `self.pending` (if any) through `tryProcessWatermark` and then broadcast it
    /// to every outbound stream, tolerating backpressure on either step across calls.
    fn drive_pending(&mut self, made_progress: &mut bool) -> Result<(), WatermarkError<P::Error>> {
        let Some(pending) = self.pending else {
            return Ok(());
        };

        if !self.pending_absorbed {
            let absorbed = self.processor.try_process_watermark(pending, &mut self.outbound)?;
            if absorbed {
                *made_progress = true;
                self.pending_absorbed = true;
            }
        }

        if !self.pending_absorbed {
            return Ok(());
        }

        let mut all_emitted = true;
        for (i, outbound) in self.outbound.iter_mut().enumerate() {
            if self.emitted_mask[i] {
                continue;
            }
            match outbound.offer_watermark(pending) {
                Ok(()) => {
                    self.emitted_mask[i] = true;
                    *made_progress = true;
                }
                Err(_) => all_emitted = false,
            }
        }

        if all_emitted {
            log_watermark_debug!("watermark emitted to all outbound streams", value = pending.value());
            self.last_emitted = pending;
            self.pending = None;
            self.pending_absorbed = false;
        }

        Ok(())
    }
}
