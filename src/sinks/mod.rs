//! Sink writer implementations

pub mod console;
pub mod io_writer;
pub mod queued;
pub mod rotating_file;

pub use console::{ConsoleTarget, ConsoleWriter};
pub use io_writer::{IoWriter, SharedBuffer};
pub use queued::QueuedWriter;
pub use rotating_file::{list_archives, RotatingFileWriter};

// Re-export the trait so writers can be implemented from this module alone
pub use crate::core::SinkWriter;
