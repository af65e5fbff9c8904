//! Enqueued sink writer
//!
//! Moves the actual I/O of a sink onto a dedicated worker thread. Callers
//! only pay for a channel send; the worker drains records in order and
//! owns the wrapped writer exclusively, so a rotating file behind a queue
//! still sees one record at a time.

use crate::core::error::{LoggerError, Result};
use crate::core::logger::DEFAULT_SHUTDOWN_TIMEOUT;
use crate::core::record::LogRecord;
use crate::core::registry::{panic_message, ErrorReporter, SinkIssue};
use crate::core::writer::SinkWriter;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

enum Command {
    Write(Box<LogRecord>, String),
    Flush(Sender<Result<()>>),
}

/// Writer that hands records to a background worker
///
/// Failures inside the worker cannot be returned to the caller, so they
/// go to the [`ErrorReporter`] of the owning registry instead. Dropping the
/// writer closes the queue and waits up to [`DEFAULT_SHUTDOWN_TIMEOUT`]
/// for pending records to be written.
///
/// # Example
///
/// ```
/// use rust_log_loader::core::{LoggerMetrics, ErrorReporter};
/// use rust_log_loader::sinks::{IoWriter, QueuedWriter, SharedBuffer};
/// use std::sync::Arc;
///
/// let reporter = ErrorReporter::new(Arc::new(LoggerMetrics::new()), None);
/// let buffer = SharedBuffer::new();
/// let writer = QueuedWriter::spawn("FILE", Box::new(IoWriter::new(buffer)), reporter)?;
/// # Ok::<(), rust_log_loader::core::LoggerError>(())
/// ```
pub struct QueuedWriter {
    sink: String,
    kind: String,
    sender: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl QueuedWriter {
    /// Start a worker thread named `log-sink-<sink>` that owns `writer`
    pub fn spawn(
        sink: impl Into<String>,
        writer: Box<dyn SinkWriter>,
        reporter: ErrorReporter,
    ) -> Result<Self> {
        let sink = sink.into();
        let kind = format!("queued:{}", writer.kind());
        let (sender, receiver) = unbounded();

        let worker_sink = sink.clone();
        let handle = thread::Builder::new()
            .name(format!("log-sink-{}", sink.to_lowercase()))
            .spawn(move || run_worker(&worker_sink, writer, receiver, reporter))
            .map_err(|e| {
                LoggerError::io_operation(
                    "spawn sink worker",
                    format!("Failed to start worker for sink '{}'", sink),
                    e,
                )
            })?;

        Ok(Self {
            sink,
            kind,
            sender: Some(sender),
            handle: Some(handle),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    /// How long flush and drop wait for the worker
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    fn send(&self, command: Command) -> Result<()> {
        let sender = self.sender.as_ref().ok_or_else(|| LoggerError::ChannelSend {
            sink: self.sink.clone(),
        })?;
        sender.send(command).map_err(|_| LoggerError::ChannelSend {
            sink: self.sink.clone(),
        })
    }

    /// Close the queue and wait for the worker to drain it
    ///
    /// Returns `false` if the worker panicked or did not finish in time.
    pub fn shutdown(&mut self) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Worker for sink '{}' panicked during shutdown: {}",
                        self.sink,
                        panic_message(e.as_ref())
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= self.shutdown_timeout {
                eprintln!(
                    "[LOGGER WARNING] Worker for sink '{}' did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    self.sink, self.shutdown_timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl SinkWriter for QueuedWriter {
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        self.send(Command::Write(Box::new(record.clone()), line.to_string()))
    }

    /// Wait until every record queued so far has been written and flushed
    fn flush(&mut self) -> Result<()> {
        let (reply, done) = bounded(1);
        self.send(Command::Flush(reply))?;
        done.recv_timeout(self.shutdown_timeout).map_err(|_| {
            LoggerError::writer(format!(
                "Sink '{}' did not acknowledge flush within {:?}",
                self.sink, self.shutdown_timeout
            ))
        })?
    }

    fn kind(&self) -> &str {
        &self.kind
    }
}

impl Drop for QueuedWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    sink: &str,
    mut writer: Box<dyn SinkWriter>,
    receiver: Receiver<Command>,
    reporter: ErrorReporter,
) {
    for command in receiver.iter() {
        match command {
            Command::Write(record, line) => {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    writer.write(&record, &line)
                }));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => reporter.report(SinkIssue::Write {
                        sink: sink.to_string(),
                        message: e.to_string(),
                    }),
                    Err(panic_info) => reporter.report(SinkIssue::Panic {
                        sink: sink.to_string(),
                        message: panic_message(panic_info.as_ref()),
                    }),
                }
            }
            Command::Flush(reply) => {
                let _ = reply.send(writer.flush());
            }
        }
    }

    // queue closed: everything sent before the close has been handled
    if let Err(e) = writer.flush() {
        eprintln!("[LOGGER ERROR] Sink '{}' final flush failed: {}", sink, e);
    }
}
