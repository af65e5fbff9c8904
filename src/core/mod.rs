//! Core logger types and traits

pub mod error;
pub mod extra;
pub mod filter;
pub mod formatter;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod rotation;
pub mod template;
pub mod timestamp;
pub mod writer;

pub use error::{LoggerError, Result};
pub use extra::{Extra, FieldValue};
pub use filter::{Filter, SinkClass};
pub use formatter::{Formatter, Rendered, TemplateFormatter};
pub use log_level::LogLevel;
pub use logger::{Logger, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use record::{ErrorInfo, Location, LogRecord, ProcessInfo, ThreadInfo};
pub use registry::{
    DispatchReport, ErrorCallback, ErrorReporter, HandlerRef, SinkDescriptor, SinkId, SinkIssue,
    SinkRegistry,
};
pub use rotation::{RetentionPolicy, RotationPolicy, RotationTrigger};
pub use template::Template;
pub use timestamp::{TimePattern, TimestampFormat};
pub use writer::SinkWriter;
