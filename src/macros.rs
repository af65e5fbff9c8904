//! Logging macros
//!
//! Like `format!`, but the record also carries the call site (`file!()`,
//! `line!()`, `module_path!()` and the enclosing function), which
//! templates show through `{name}`, `{file}`, `{line}` and `{function}`.
//!
//! # Examples
//!
//! ```
//! use rust_log_loader::prelude::*;
//! use rust_log_loader::info;
//! use std::sync::Arc;
//!
//! let logger = Logger::new(Arc::new(SinkRegistry::new()));
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_loader::prelude::*;
/// # let logger = Logger::new(std::sync::Arc::new(SinkRegistry::new()));
/// use rust_log_loader::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            format!($($arg)+),
            $crate::core::Location::new(file!(), line!(), module_path!())
                .with_function_path($crate::__function_path!()),
        )
    };
}

/// `type_name` path of the enclosing function
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = type_name_of(here);
        path.strip_suffix("::here").unwrap_or(path)
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// # use rust_log_loader::prelude::*;
/// # let logger = Logger::new(std::sync::Arc::new(SinkRegistry::new()));
/// use rust_log_loader::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

/// Log a success-level message.
#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Success, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_log_loader::prelude::*;
/// # let logger = Logger::new(std::sync::Arc::new(SinkRegistry::new()));
/// use rust_log_loader::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Critical, $($arg)+)
    };
}
