use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::parser::LogParser;
use crate::store::{SharedStore, StoreError};

/// Pending lines are flushed into the store on this tick
pub const BATCH_INTERVAL: Duration = Duration::from_millis(16);

/// Read size per chunk
const READ_CHUNK: usize = 8 * 1024;

/// Where lines come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestSource {
    /// Piped standard input, until EOF
    Stdin,
    /// A shell command (`sh -c`), stdout and stderr until exit
    Command(String),
}

/// Fatal ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Progress reported by the pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestEvent {
    /// A batch was committed to the store
    BatchInserted { inserted: usize, evicted: usize },
    /// The store rejected a batch
    BatchDropped { count: usize, error: StoreError },
    /// The source is exhausted and every line has been flushed
    Finished { exit_code: Option<i32> },
}

/// Counters shared by the pipeline tasks
#[derive(Debug, Default)]
pub struct IngestStats {
    received: AtomicU64,
    dropped: AtomicU64,
}

impl IngestStats {
    /// Non-blank lines handed to the store
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Lines lost to rejected batches
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Line assembly
// ============================================================================

/// Reassembles complete lines from arbitrary byte chunks
///
/// Bytes after the last newline are carried over to the next chunk, so a
/// multi-byte character split across reads decodes correctly.
#[derive(Debug, Default)]
pub struct LineAssembler {
    carry: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let Some(last_newline) = chunk.iter().rposition(|b| *b == b'\n') else {
            self.carry.extend_from_slice(chunk);
            return Vec::new();
        };

        self.carry.extend_from_slice(&chunk[..last_newline]);
        let complete = std::mem::take(&mut self.carry);
        self.carry.extend_from_slice(&chunk[last_newline + 1..]);

        complete.split(|b| *b == b'\n').map(decode_line).collect()
    }

    /// Flush the held partial line at stream end
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        Some(decode_line(&std::mem::take(&mut self.carry)))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Global source line ordinal
#[derive(Debug, Default)]
pub struct LineCounter(AtomicU64);

impl LineCounter {
    /// Advance and return the new ordinal (first line is 1)
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last ordinal handed out
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// State shared between the readers, the process supervisor and the flusher
#[derive(Default)]
struct Shared {
    /// Completed lines waiting for the next flush
    pending: Mutex<Vec<String>>,

    /// Reader tasks still draining
    active_readers: AtomicUsize,

    /// Set once the source has ended, with the process exit code if any
    exit: Mutex<Option<Option<i32>>>,

    counter: LineCounter,
    stats: IngestStats,
}

impl Shared {
    fn is_finished(&self) -> bool {
        self.active_readers.load(Ordering::SeqCst) == 0 && self.exit.lock().is_some()
    }
}

/// Reads a source, batches lines on a timer and feeds parser and store
pub struct IngestPipeline {
    /// Cancellation token for stopping every task
    cancel: CancellationToken,

    /// Reader, supervisor and flusher task handles
    tasks: Vec<JoinHandle<()>>,

    shared: Arc<Shared>,
    store: SharedStore,
    parser: Arc<LogParser>,
    event_tx: mpsc::UnboundedSender<IngestEvent>,
    flusher_started: bool,
}

impl IngestPipeline {
    /// Create a pipeline writing into `store`
    pub fn new(
        store: SharedStore,
        parser: LogParser,
        event_tx: mpsc::UnboundedSender<IngestEvent>,
    ) -> Self {
        Self {
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            shared: Arc::new(Shared::default()),
            store,
            parser: Arc::new(parser),
            event_tx,
            flusher_started: false,
        }
    }

    /// Start ingesting from a source
    pub fn start(&mut self, source: IngestSource) -> Result<(), IngestError> {
        match source {
            IngestSource::Stdin => {
                self.start_reader(tokio::io::stdin());
                Ok(())
            }
            IngestSource::Command(command) => self.spawn_command(&command),
        }
    }

    /// Ingest from any byte stream until EOF
    pub fn start_reader<R>(&mut self, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        *self.shared.exit.lock() = Some(None);
        self.spawn_reader(reader);
        self.spawn_flusher();
    }

    fn spawn_command(&mut self, command: &str) -> Result<(), IngestError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| IngestError::Spawn {
                command: command.to_string(),
                source,
            })?;

        tracing::debug!(command, pid = ?child.id(), "Spawned source command");

        if let Some(stdout) = child.stdout.take() {
            self.spawn_reader(stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            self.spawn_reader(stderr);
        }

        let cancel = self.cancel.clone();
        let shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(async move {
            let exit_code = tokio::select! {
                _ = cancel.cancelled() => return,
                status = child.wait() => match status {
                    Ok(status) => status.code(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to wait for source command");
                        None
                    }
                },
            };
            if exit_code != Some(0) {
                tracing::warn!(?exit_code, "Source command exited unsuccessfully");
            }
            *shared.exit.lock() = Some(exit_code);
        }));

        self.spawn_flusher();
        Ok(())
    }

    fn spawn_reader<R>(&mut self, mut reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let shared = Arc::clone(&self.shared);
        shared.active_readers.fetch_add(1, Ordering::SeqCst);

        self.tasks.push(tokio::spawn(async move {
            let mut assembler = LineAssembler::new();
            let mut buf = vec![0u8; READ_CHUNK];

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,

                    result = reader.read(&mut buf) => {
                        match result {
                            Ok(0) => break,
                            Ok(n) => {
                                let lines = assembler.push(&buf[..n]);
                                if !lines.is_empty() {
                                    shared.pending.lock().extend(lines);
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Error reading log source");
                                break;
                            }
                        }
                    }
                }
            }

            if let Some(line) = assembler.finish() {
                shared.pending.lock().push(line);
            }
            shared.active_readers.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    fn spawn_flusher(&mut self) {
        if self.flusher_started {
            return;
        }
        self.flusher_started = true;

        let cancel = self.cancel.clone();
        let shared = Arc::clone(&self.shared);
        let store = Arc::clone(&self.store);
        let parser = Arc::clone(&self.parser);
        let event_tx = self.event_tx.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(BATCH_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Observed before draining, so no line can slip in after
                        let finished = shared.is_finished();
                        flush(&shared, store.as_ref(), &parser, &event_tx);

                        if finished {
                            let exit_code = shared.exit.lock().flatten();
                            let _ = event_tx.send(IngestEvent::Finished { exit_code });
                            break;
                        }
                    }
                }
            }
        }));
    }

    /// The global line counter
    pub fn line_counter(&self) -> &LineCounter {
        &self.shared.counter
    }

    pub fn stats(&self) -> &IngestStats {
        &self.shared.stats
    }

    /// Stop all tasks and kill the child process, if any
    pub fn stop(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.cancel = CancellationToken::new();
        self.flusher_started = false;
    }
}

impl Drop for IngestPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drain pending lines, parse and commit them as one batch
fn flush(
    shared: &Shared,
    store: &dyn crate::store::LogStore,
    parser: &LogParser,
    event_tx: &mpsc::UnboundedSender<IngestEvent>,
) {
    let lines = std::mem::take(&mut *shared.pending.lock());
    if lines.is_empty() {
        return;
    }

    let records: Vec<_> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parser.parse(line, shared.counter.next()))
        .collect();
    if records.is_empty() {
        return;
    }

    let count = records.len();
    shared.stats.received.fetch_add(count as u64, Ordering::Relaxed);

    match store.insert_batch(records) {
        Ok(evicted) => {
            tracing::debug!(count, evicted, "Flushed batch");
            let _ = event_tx.send(IngestEvent::BatchInserted {
                inserted: count,
                evicted,
            });
        }
        Err(error) => {
            tracing::warn!(count, %error, "Dropping batch rejected by store");
            shared.stats.dropped.fetch_add(count as u64, Ordering::Relaxed);
            let _ = event_tx.send(IngestEvent::BatchDropped { count, error });
        }
    }
}
