//! Thin wrapper over the `notify` crate's directory watcher, translating its events
//! into four kinds: `CREATE`, `MODIFY`, `DELETE`, `OVERFLOW`.
//!
//! This source watches exactly one directory, non-recursively.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tasklet_config::log_tail_warn;

use crate::TailError;

/// One drained filesystem event, collapsed to four kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Create(PathBuf),
    Modify(PathBuf),
    Delete(PathBuf),
    Overflow,
}

pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<notify::Event>>,
}

impl FsWatcher {
    /// Start watching `directory` (non-recursively) with the highest-sensitivity
    /// polling the platform backend offers.
    pub fn new(directory: &Path) -> Result<Self, TailError> {
        let (tx, rx) = mpsc::channel();

        let config = Config::default().with_poll_interval(Duration::from_millis(200));
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            config,
        )
        .map_err(TailError::WatcherInit)?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(TailError::WatcherInit)?;

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Drain whatever events are already queued, blocking up to `timeout` only when
    /// `allow_block` is set and nothing is queued yet.
    pub fn drain(
        &mut self,
        allow_block: bool,
        timeout: Duration,
    ) -> Result<Vec<WatchEvent>, TailError> {
        let mut out = Vec::new();

        let first = if allow_block {
            match self.events.recv_timeout(timeout) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return Err(TailError::WatcherDisconnected),
            }
        } else {
            match self.events.try_recv() {
                Ok(event) => Some(event),
                Err(mpsc::TryRecvError::Empty) => None,
                Err(mpsc::TryRecvError::Disconnected) => return Err(TailError::WatcherDisconnected),
            }
        };

        if let Some(event) = first {
            self.push_translated(event, &mut out)?;
        }

        loop {
            match self.events.try_recv() {
                Ok(event) => self.push_translated(event, &mut out)?,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return Err(TailError::WatcherDisconnected),
            }
        }

        Ok(out)
    }

    fn push_translated(
        &self,
        event: notify::Result<notify::Event>,
        out: &mut Vec<WatchEvent>,
    ) -> Result<(), TailError> {
        match event {
            Err(err) => {
                // The platform backend (e.g. an inotify queue overflow) surfaces
                // trouble as a channel error rather than a distinct event kind.
                // Treated as OVERFLOW: best-effort, non-fatal, and self-healing on the
                // next MODIFY.
                log_tail_warn!("filesystem watch overflow", error = %err);
                out.push(WatchEvent::Overflow);
                Ok(())
            }
            Ok(event) => match event.kind {
                EventKind::Create(_) => {
                    out.extend(event.paths.into_iter().map(WatchEvent::Create));
                    Ok(())
                }
                EventKind::Modify(_) => {
                    out.extend(event.paths.into_iter().map(WatchEvent::Modify));
                    Ok(())
                }
                EventKind::Remove(_) => {
                    out.extend(event.paths.into_iter().map(WatchEvent::Delete));
                    Ok(())
                }
                EventKind::Other => {
                    // Backends use `Other` to signal "something happened, rescan
                    // recommended" rather than a hard failure.
                    out.push(WatchEvent::Overflow);
                    Ok(())
                }
                EventKind::Any | EventKind::Access(_) => Err(TailError::UnknownEventKind),
            },
        }
    }
}
