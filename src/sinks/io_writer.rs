//! Adapter for arbitrary `io::Write` destinations

use crate::core::{LogRecord, Result, SinkWriter};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Sink writer over any `io::Write`
///
/// Lines are newline-terminated and flushed after each record.
///
/// # Examples
///
/// ```
/// use rust_log_loader::sinks::{IoWriter, SharedBuffer};
///
/// let buffer = SharedBuffer::new();
/// let writer = IoWriter::new(buffer.clone());
/// ```
pub struct IoWriter<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> SinkWriter for IoWriter<W> {
    fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    fn kind(&self) -> &str {
        "io"
    }
}

/// In-memory `io::Write` that can be read back while a sink owns a clone
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Written lines without their terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_lines_are_terminated() {
        let buffer = SharedBuffer::new();
        let mut writer = IoWriter::new(buffer.clone());
        let record = LogRecord::new(LogLevel::Info, "a");

        writer.write(&record, "first").unwrap();
        writer.write(&record, "second").unwrap();

        assert_eq!(buffer.contents(), "first\nsecond\n");
        assert_eq!(buffer.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_vec_target() {
        let mut writer = IoWriter::new(Vec::new());
        writer
            .write(&LogRecord::new(LogLevel::Info, "x"), "x")
            .unwrap();
        assert_eq!(writer.into_inner(), b"x\n");
    }
}
