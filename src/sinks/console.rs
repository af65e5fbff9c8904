//! Console writer implementation

use crate::core::{LogLevel, LogRecord, Result, SinkWriter};
use std::io::Write;

/// Which standard stream a console sink writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    /// Records below ERROR to stdout, the rest to stderr
    #[default]
    Split,
    Stdout,
    Stderr,
}

pub struct ConsoleWriter {
    target: ConsoleTarget,
}

impl ConsoleWriter {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Split,
        }
    }

    pub fn with_target(target: ConsoleTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn use_stderr(&self, level: LogLevel) -> bool {
        match self.target {
            ConsoleTarget::Split => level >= LogLevel::Error,
            ConsoleTarget::Stdout => false,
            ConsoleTarget::Stderr => true,
        }
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkWriter for ConsoleWriter {
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        // Route ERROR and CRITICAL to stderr, others to stdout
        if self.use_stderr(record.level()) {
            let mut err = std::io::stderr().lock();
            writeln!(err, "{}", line)?;
        } else {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn kind(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_routing() {
        let writer = ConsoleWriter::new();
        assert!(!writer.use_stderr(LogLevel::Warning));
        assert!(writer.use_stderr(LogLevel::Error));
        assert!(writer.use_stderr(LogLevel::Critical));
    }

    #[test]
    fn test_fixed_targets() {
        assert!(!ConsoleWriter::with_target(ConsoleTarget::Stdout).use_stderr(LogLevel::Critical));
        assert!(ConsoleWriter::with_target(ConsoleTarget::Stderr).use_stderr(LogLevel::Trace));
    }

    #[test]
    fn test_write_and_flush() {
        let mut writer = ConsoleWriter::new();
        let record = LogRecord::new(LogLevel::Info, "console test");
        assert!(writer.write(&record, "console test").is_ok());
        assert!(writer.flush().is_ok());
        assert_eq!(writer.kind(), "console");
    }
}
