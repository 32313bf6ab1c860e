//! The directory-tailing source itself.

use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tasklet_config::{log_tail_debug, log_tail_info, log_tail_warn};
use tasklet_core::{Outbox, ProgressState};

use crate::offset::{decode_offset, FileOffsetMap, OpenPlan};
use crate::partition::belongs_to;
use crate::reader::{LineOutcome, LineReader};
use crate::watch::{FsWatcher, WatchEvent};
use crate::{Result, TailError};

/// Construction parameters for a [`FileTailSource`].
#[derive(Debug, Clone)]
pub struct FileTailSourceConfig {
    pub directory: PathBuf,
    pub encoding: &'static encoding_rs::Encoding,
    pub glob: String,
    pub parallelism: u32,
    pub id: u32,
    pub lines_per_batch: usize,
    pub watch_poll_seconds: u64,
}

impl FileTailSourceConfig {
    pub fn new(directory: impl Into<PathBuf>, glob: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            encoding: encoding_rs::UTF_8,
            glob: glob.into(),
            parallelism: 1,
            id: 0,
            lines_per_batch: 64,
            watch_poll_seconds: 1,
        }
    }
}

impl Default for FileTailSourceConfig {
    fn default() -> Self {
        Self::new(".", "*")
    }
}

/// The file currently open for reading, at most one per source instance.
struct CurrentFile {
    path: PathBuf,
    reader: LineReader<File>,
    /// A line that was read but rejected by the outbox (backpressure); retried before
    /// any further reading happens.
    pending_line: Option<String>,
}

/// Insertion-ordered, dedup-enforcing queue of paths awaiting a read.
#[derive(Default)]
struct PendingEventQueue {
    order: VecDeque<PathBuf>,
    queued: HashSet<PathBuf>,
}

impl PendingEventQueue {
    fn push(&mut self, path: PathBuf) {
        if self.queued.insert(path.clone()) {
            self.order.push_back(path);
        }
    }

    fn pop(&mut self) -> Option<PathBuf> {
        let path = self.order.pop_front()?;
        self.queued.remove(&path);
        Some(path)
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Cooperative source: watches `config.directory`, tails matching files, and emits each
/// newly-appended line exactly once to `outbox`, across `config.parallelism` sibling
/// instances partitioned by file name hash.
pub struct FileTailSource<O: Outbox<String>> {
    config: FileTailSourceConfig,
    pattern: glob::Pattern,
    outbox: O,
    watcher: Option<FsWatcher>,
    offsets: FileOffsetMap,
    queue: PendingEventQueue,
    current: Option<CurrentFile>,
    closed: bool,
}

impl<O: Outbox<String>> FileTailSource<O> {
    pub fn new(config: FileTailSourceConfig, outbox: O) -> Result<Self> {
        let pattern = glob::Pattern::new(&config.glob).map_err(|source| TailError::InvalidGlob {
            pattern: config.glob.clone(),
            source,
        })?;

        Ok(Self {
            config,
            pattern,
            outbox,
            watcher: None,
            offsets: FileOffsetMap::new(),
            queue: PendingEventQueue::default(),
            current: None,
            closed: false,
        })
    }

    /// Enumerate the directory, seed every matching, owned file as "unseen at its
    /// current size", and start the filesystem watcher.
    pub fn init(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.config.directory).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TailError::DirectoryGone
            } else {
                TailError::Io {
                    path: self.config.directory.clone(),
                    source,
                }
            }
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| TailError::Io {
                path: self.config.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if !self.is_owned_regular_file(&path) {
                continue;
            }
            let metadata = entry.metadata().map_err(|source| TailError::Io {
                path: path.clone(),
                source,
            })?;
            self.offsets.observe_unseen(path, metadata.len());
        }

        self.watcher = Some(FsWatcher::new(&self.config.directory)?);
        log_tail_info!("tail source initialized", directory = %self.config.directory.display());
        Ok(())
    }

    /// One cooperative step: drains pending watch events, opens the next queued file if
    /// none is currently open, and reads up to one batch of lines from it.
    pub fn complete(&mut self) -> Result<ProgressState> {
        if self.closed && self.queue.is_empty() && self.current.is_none() {
            return Ok(ProgressState::WasAlreadyDone);
        }

        let mut made_progress = false;

        if !self.closed {
            let allow_block = self.current.is_none() && self.queue.is_empty();
            made_progress |= self.drain_watch_events(allow_block)?;
        }

        if self.current.is_none() {
            if let Some(path) = self.queue.pop() {
                made_progress = true;
                self.open_file(path)?;
            }
        }

        if self.current.is_some() {
            made_progress |= self.read_batch()?;
        }

        if self.closed && self.queue.is_empty() && self.current.is_none() {
            Ok(ProgressState::Done)
        } else {
            Ok(ProgressState::from_made_progress(made_progress))
        }
    }

    /// Close the current file and the watcher. Idempotent; subsequent `complete` calls
    /// simply drain whatever remains queued.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.current = None;
        self.watcher = None;
        log_tail_info!("tail source closing", directory = %self.config.directory.display());
    }

    fn is_owned_regular_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.pattern.matches(name) {
            return false;
        }
        belongs_to(name, self.config.parallelism, self.config.id)
    }

    fn drain_watch_events(&mut self, allow_block: bool) -> Result<bool> {
        let Some(watcher) = self.watcher.as_mut() else {
            return Ok(false);
        };

        let timeout = Duration::from_secs(self.config.watch_poll_seconds);
        let events = match watcher.drain(allow_block, timeout) {
            Ok(events) => events,
            Err(TailError::WatcherDisconnected) => {
                log_tail_warn!("watcher disconnected, closing source");
                self.close();
                return Ok(true);
            }
            Err(err) => {
                self.close();
                return Err(err);
            }
        };

        if events.is_empty() {
            return Ok(false);
        }

        for event in events {
            self.handle_watch_event(event)?;
        }
        Ok(true)
    }

    fn handle_watch_event(&mut self, event: WatchEvent) -> Result<()> {
        match event {
            WatchEvent::Create(path) | WatchEvent::Modify(path) => {
                if !self.is_owned_regular_file(&path) {
                    return Ok(());
                }
                if !self.offsets.contains(&path) {
                    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                    self.offsets.observe_unseen(path.clone(), size);
                }
                self.queue.push(path);
                Ok(())
            }
            WatchEvent::Delete(path) => {
                self.offsets.remove(&path);
                if self.current.as_ref().map(|c| &c.path) == Some(&path) {
                    self.current = None;
                }
                Ok(())
            }
            WatchEvent::Overflow => {
                log_tail_warn!("filesystem watch overflow, some appends may be missed");
                Ok(())
            }
        }
    }

    fn open_file(&mut self, path: PathBuf) -> Result<()> {
        let Some(raw) = self.offsets.get(&path) else {
            log_tail_warn!("file vanished before open", path = %path.display());
            return Ok(());
        };

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                log_tail_warn!("file vanished before open", path = %path.display());
                return Ok(());
            }
            Err(source) => return Err(TailError::Io { path, source }),
        };

        match decode_offset(raw) {
            OpenPlan::Resume(pos) => {
                file.seek(SeekFrom::Start(pos))
                    .map_err(|source| TailError::Io { path: path.clone(), source })?;
                self.current = Some(CurrentFile {
                    reader: LineReader::new(file, pos, self.config.encoding),
                    path,
                    pending_line: None,
                });
            }
            OpenPlan::SkipPartialThenResume { size_at_observation } => {
                let skip_to = size_at_observation - 1;
                file.seek(SeekFrom::Start(skip_to))
                    .map_err(|source| TailError::Io { path: path.clone(), source })?;
                let mut reader = LineReader::new(file, skip_to, self.config.encoding);
                let found_terminator = reader
                    .skip_to_next_line()
                    .map_err(|source| TailError::Io { path: path.clone(), source })?;
                if found_terminator {
                    self.offsets.set_resume(&path, reader.position());
                    self.current = Some(CurrentFile {
                        reader,
                        path,
                        pending_line: None,
                    });
                }
                // Otherwise the partial line at the tail still hasn't been terminated;
                // leave the offset as-is and retry on the next MODIFY.
            }
        }

        Ok(())
    }

    /// Read and emit up to `lines_per_batch` lines from the current file. Returns
    /// whether any line was emitted.
    fn read_batch(&mut self) -> Result<bool> {
        let mut current = match self.current.take() {
            Some(current) => current,
            None => return Ok(false),
        };

        let mut emitted_any = false;
        let mut lines_read = 0usize;
        let mut eof_reached = false;

        loop {
            if let Some(pending) = current.pending_line.take() {
                match self.outbox.offer(pending) {
                    Ok(()) => emitted_any = true,
                    Err(rejected) => {
                        current.pending_line = Some(rejected);
                        break;
                    }
                }
            }

            if lines_read >= self.config.lines_per_batch {
                break;
            }

            let outcome = current
                .reader
                .read_line()
                .map_err(|source| TailError::Io {
                    path: current.path.clone(),
                    source,
                })?;

            match outcome {
                LineOutcome::Line(line) => {
                    lines_read += 1;
                    match self.outbox.offer(line) {
                        Ok(()) => emitted_any = true,
                        Err(rejected) => {
                            current.pending_line = Some(rejected);
                            break;
                        }
                    }
                }
                LineOutcome::NoMore => {
                    eof_reached = true;
                    break;
                }
            }
        }

        if eof_reached {
            log_tail_debug!(
                "reached end of file, persisting offset",
                path = %current.path.display(),
                position = current.reader.position(),
            );
            self.offsets.set_resume(&current.path, current.reader.position());
        }

        // The file stays open (and the reader's partial-line buffer stays intact) even
        // at EOF: the next append is visible through this same handle, so a line split
        // across polls is joined here instead of being lost to a fresh `LineReader` on
        // reopen.
        self.current = Some(current);

        Ok(emitted_any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tasklet_core::VecOutbox;
    use tempfile::tempdir;

    fn config_for(dir: &Path) -> FileTailSourceConfig {
        let mut config = FileTailSourceConfig::new(dir, "*.log");
        config.lines_per_batch = 64;
        config.watch_poll_seconds = 0;
        config
    }

    #[test]
    fn tails_lines_appended_after_init() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.log");
        std::fs::write(&file_path, "existing\n").unwrap();

        let outbox: VecOutbox<String> = VecOutbox::unbounded();
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();

        // Content present before init must not be re-emitted.
        source.queue.push(file_path.clone());
        source.complete().unwrap();
        assert!(source.outbox.as_slice().is_empty());

        let mut file = std::fs::OpenOptions::new().append(true).open(&file_path).unwrap();
        writeln!(file, "new line one").unwrap();
        writeln!(file, "new line two").unwrap();
        drop(file);

        source.queue.push(file_path);
        source.complete().unwrap();

        assert_eq!(
            source.outbox.as_slice(),
            &["new line one".to_string(), "new line two".to_string()]
        );
    }

    #[test]
    fn backpressure_retains_rejected_line_for_retry() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.log");
        std::fs::write(&file_path, "").unwrap();

        let outbox: VecOutbox<String> = VecOutbox::bounded(1);
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();

        let mut file = std::fs::OpenOptions::new().append(true).open(&file_path).unwrap();
        writeln!(file, "one").unwrap();
        writeln!(file, "two").unwrap();
        drop(file);

        source.queue.push(file_path);
        source.complete().unwrap();
        assert_eq!(source.outbox.as_slice(), &["one".to_string()]);
        assert!(source.current.is_some(), "file must stay open across backpressure");

        source.outbox.drain();
        source.complete().unwrap();
        assert_eq!(source.outbox.as_slice(), &["two".to_string()]);
    }

    #[test]
    fn file_deleted_between_queue_and_open_is_silently_dropped() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.log");
        std::fs::write(&file_path, "x\n").unwrap();

        let outbox: VecOutbox<String> = VecOutbox::unbounded();
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();

        source.offsets.set_resume(&file_path, 0);
        std::fs::remove_file(&file_path).unwrap();

        source.queue.push(file_path);
        let progress = source.complete().unwrap();
        assert!(matches!(progress, ProgressState::MadeProgress));
        assert!(source.current.is_none());
    }

    #[test]
    fn close_then_complete_drains_queue_then_reports_done() {
        let dir = tempdir().unwrap();
        let outbox: VecOutbox<String> = VecOutbox::unbounded();
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();
        source.close();

        assert_eq!(source.complete().unwrap(), ProgressState::Done);
        assert_eq!(source.complete().unwrap(), ProgressState::WasAlreadyDone);
    }

    #[test]
    fn line_split_across_two_polls_is_joined_on_the_second() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.log");
        std::fs::write(&file_path, "").unwrap();

        let outbox: VecOutbox<String> = VecOutbox::unbounded();
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();

        let mut file = std::fs::OpenOptions::new().append(true).open(&file_path).unwrap();
        write!(file, "partial").unwrap();
        file.flush().unwrap();
        drop(file);

        source.queue.push(file_path.clone());
        source.complete().unwrap();
        assert!(source.outbox.as_slice().is_empty(), "no terminator seen yet");

        let mut file = std::fs::OpenOptions::new().append(true).open(&file_path).unwrap();
        writeln!(file, " line").unwrap();
        drop(file);

        source.queue.push(file_path);
        source.complete().unwrap();
        assert_eq!(source.outbox.as_slice(), &["partial line".to_string()]);
    }

    #[test]
    fn parallelism_one_owns_every_matching_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "").unwrap();
        std::fs::write(dir.path().join("b.log"), "").unwrap();
        std::fs::write(dir.path().join("c.txt"), "").unwrap();

        let outbox: VecOutbox<String> = VecOutbox::unbounded();
        let mut source = FileTailSource::new(config_for(dir.path()), outbox).unwrap();
        source.init().unwrap();

        assert_eq!(source.offsets.len(), 2);
    }
}
