//! Writer trait for sink output destinations

use super::{error::Result, record::LogRecord};

/// Byte destination of a sink
///
/// `line` is the formatted record without a trailing newline; the writer
/// terminates it. The record is passed along for writers that route on
/// its fields, e.g. by level or timestamp.
pub trait SinkWriter: Send {
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn kind(&self) -> &str;
}

impl<W: SinkWriter + ?Sized> SinkWriter for Box<W> {
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        (**self).write(record, line)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn kind(&self) -> &str {
        (**self).kind()
    }
}
