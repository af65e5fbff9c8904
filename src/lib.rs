//! # rust_log_loader
//!
//! Configuration-driven structured logging with rotating files.
//!
//! ## Features
//!
//! - **Config Driven**: YAML/JSON configuration, deep-merged patches and
//!   environment overrides decide which sinks exist
//! - **Multi-Sink Dispatch**: every record is offered to every registered
//!   sink, each with its own level, filter and formatter
//! - **Rotation**: size and time-of-day rotation with retention and gzip
//!   archives
//! - **Non-Blocking Files**: file sinks write on background workers
//! - **`log` Facade**: records from libraries using the `log` crate are
//!   routed in by module
//! - **HTTP Access Logs**: access-line and JSON sinks for request metadata
//!
//! ## Quick start
//!
//! ```no_run
//! use rust_log_loader::prelude::*;
//! use serde_json::json;
//!
//! let loader = LoggerLoader::builder()
//!     .config(json!({"app_name": "api", "file": {"log_handlers": {"enabled": true}}}))
//!     .build()?;
//! let logger = loader.load()?;
//!
//! logger.info("started");
//! rust_log_loader::warning!(logger, "{} retries left", 2);
//! # Ok::<(), LoggerError>(())
//! ```

pub mod config;
pub mod core;
pub mod env;
pub mod http;
pub mod intercept;
pub mod loader;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::config::LoggerConfig;
    pub use crate::core::{
        Extra, FieldValue, Filter, Formatter, LogLevel, LogRecord, Logger, LoggerError, Result,
        RetentionPolicy, RotationPolicy, SinkId, SinkRegistry, SinkWriter, TemplateFormatter,
    };
    pub use crate::http::HttpInfo;
    pub use crate::loader::{LoggerLoader, SinkOptions, SinkTarget};
}

pub use config::LoggerConfig;
pub use crate::core::{
    DispatchReport, ErrorInfo, Extra, FieldValue, Filter, Formatter, Location, LogLevel,
    LogRecord, Logger, LoggerError, LoggerMetrics, Result, RetentionPolicy, RotationPolicy,
    SinkClass, SinkDescriptor, SinkId, SinkIssue, SinkRegistry, SinkWriter, TemplateFormatter,
    TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use env::EnvOverrides;
pub use http::HttpInfo;
pub use intercept::{InterceptRules, Interceptor};
pub use loader::{LoggerLoader, LoggerLoaderBuilder, SinkOptions, SinkTarget};
pub use sinks::{ConsoleTarget, ConsoleWriter, QueuedWriter, RotatingFileWriter};
