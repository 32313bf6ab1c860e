//! # tasklet-watermark
//!
//! A cooperative tasklet that drives a user [`tasklet_core::Processor`] across several
//! ordered inbound streams, merges the watermarks it observes under a configurable
//! retention policy, and forwards processed items and coalesced watermarks downstream.
//!
//! The tasklet itself never blocks: [`WatermarkingTasklet::call`] performs at most one
//! step of work and returns a [`tasklet_core::ProgressState`] describing what happened,
//! to be re-invoked by an external scheduler.

pub mod tasklet;

pub use tasklet::WatermarkingTasklet;

/// Errors a [`WatermarkingTasklet`] can surface. A user-processor failure is the only
/// error kind here, and it is fatal: the tasklet does not attempt to recover, it
/// surfaces the failure unchanged to its caller.
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError<E: std::error::Error + Send + Sync + 'static> {
    #[error(transparent)]
    ProcessorFailure(#[from] E),
}

pub type Result<T, E> = std::result::Result<T, WatermarkError<E>>;
