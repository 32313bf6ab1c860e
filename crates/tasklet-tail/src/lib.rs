//! # tasklet-tail
//!
//! A cooperative directory-tailing source. Watches one directory, tails the regular
//! files in it that match a glob, and partitions those files across a fixed number of
//! sibling instances without any coordination between them.
//!
//! The source is non-cooperative in one narrow sense: it may block the calling thread
//! for up to roughly one second waiting on the filesystem watcher. Everything else is a
//! bounded, single-batch step driven by repeated [`source::FileTailSource::complete`]
//! calls.

pub mod offset;
pub mod partition;
pub mod reader;
pub mod source;
pub mod watch;

pub use offset::{FileOffsetMap, OpenPlan};
pub use source::{FileTailSource, FileTailSourceConfig};
pub use watch::{FsWatcher, WatchEvent};

/// Errors a [`source::FileTailSource`] can surface. A file vanishing between being
/// queued and opened is not one of these: it is logged and skipped, not surfaced as an
/// error. Every variant here is fatal and propagates out of `complete`.
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    #[error("failed to initialize filesystem watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    #[error("filesystem watcher channel disconnected")]
    WatcherDisconnected,

    #[error("watched directory disappeared")]
    DirectoryGone,

    #[error("filesystem watcher produced an event kind with no defined handling")]
    UnknownEventKind,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

pub type Result<T> = std::result::Result<T, TailError>;
