//! HTTP access logging
//!
//! A web framework's middleware builds an [`HttpInfo`] per request and
//! hands it to [`log_access`]. The record goes to every sink like any
//! other, carrying the metadata under the `http_info` extra key; the
//! access sinks registered here only accept such records and render them
//! as access lines or JSON objects.
//!
//! ```no_run
//! use rust_log_loader::http::{self, HttpInfo};
//! use rust_log_loader::loader::LoggerLoader;
//!
//! let loader = LoggerLoader::builder().build()?;
//! let logger = loader.load()?;
//! http::add_http_file_handlers(&loader, None, None)?;
//!
//! let info = HttpInfo::new("GET", "/health", 200).with_response_time(0.8);
//! http::log_access(&logger, &info);
//! # Ok::<(), rust_log_loader::core::LoggerError>(())
//! ```

mod format;
mod info;

pub use format::{access_formatter, access_json, access_json_formatter, access_line};
pub use info::HttpInfo;

use crate::core::{
    error::Result,
    extra::FieldValue,
    filter::{Filter, HTTP_INFO_KEY},
    log_level::LogLevel,
    logger::Logger,
    registry::{DispatchReport, SinkId},
};
use crate::loader::{LoggerLoader, SinkOptions};

pub const DEFAULT_ACCESS_LOG_PATH: &str = "http/{app_name}.http.access.log";
pub const DEFAULT_ERR_LOG_PATH: &str = "http/{app_name}.http.err.log";
pub const DEFAULT_JSON_ACCESS_LOG_PATH: &str = "json.http/{app_name}.json.http.access.log";
pub const DEFAULT_JSON_ERR_LOG_PATH: &str = "json.http/{app_name}.json.http.err.log";

/// Accepts only records carrying `http_info`
pub fn http_filter() -> Filter {
    Filter::http()
}

/// Log one served request at the level its status maps to
#[track_caller]
pub fn log_access(logger: &Logger, info: &HttpInfo) -> DispatchReport {
    let record = logger
        .record(info.level(), info.summary())
        .with_field(HTTP_INFO_KEY, FieldValue::from(info));
    logger.emit(record)
}

/// Register `FILE.HTTP` and `FILE.HTTP_ERR` (WARNING and above)
///
/// Paths default to [`DEFAULT_ACCESS_LOG_PATH`] and [`DEFAULT_ERR_LOG_PATH`].
pub fn add_http_file_handlers(
    loader: &LoggerLoader,
    log_path: Option<&str>,
    err_path: Option<&str>,
) -> Result<(SinkId, SinkId)> {
    let access = loader.add_handler(
        "FILE.HTTP",
        SinkOptions::new()
            .path(log_path.unwrap_or(DEFAULT_ACCESS_LOG_PATH))
            .filter(http_filter())
            .formatter(access_formatter()),
    )?;
    let errors = loader.add_handler(
        "FILE.HTTP_ERR",
        SinkOptions::new()
            .path(err_path.unwrap_or(DEFAULT_ERR_LOG_PATH))
            .level(LogLevel::Warning)
            .filter(http_filter())
            .formatter(access_formatter()),
    )?;
    Ok((access, errors))
}

/// Register `FILE.JSON.HTTP` and `FILE.JSON.HTTP_ERR` (WARNING and above)
pub fn add_http_json_handlers(
    loader: &LoggerLoader,
    log_path: Option<&str>,
    err_path: Option<&str>,
) -> Result<(SinkId, SinkId)> {
    let access = loader.add_handler(
        "FILE.JSON.HTTP",
        SinkOptions::new()
            .path(log_path.unwrap_or(DEFAULT_JSON_ACCESS_LOG_PATH))
            .filter(http_filter())
            .formatter(access_json_formatter()),
    )?;
    let errors = loader.add_handler(
        "FILE.JSON.HTTP_ERR",
        SinkOptions::new()
            .path(err_path.unwrap_or(DEFAULT_JSON_ERR_LOG_PATH))
            .level(LogLevel::Warning)
            .filter(http_filter())
            .formatter(access_json_formatter()),
    )?;
    Ok((access, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvOverrides;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_access_handlers_only_receive_http_records() {
        let dir = tempdir().unwrap();
        let loader = LoggerLoader::builder()
            .load_config_file(false)
            .env(EnvOverrides::default())
            .config(json!({
                "app_name": "web",
                "file": {"logs_dir": dir.path()},
                "stream": {"std_handler": {"enabled": false}}
            }))
            .build()
            .unwrap();
        let logger = loader.load().unwrap();
        add_http_file_handlers(&loader, None, None).unwrap();
        add_http_json_handlers(&loader, None, None).unwrap();

        logger.error("not a request");
        log_access(&logger, &HttpInfo::new("GET", "/", 200).with_client_host("1.2.3.4"));
        log_access(&logger, &HttpInfo::new("GET", "/missing", 404));
        loader.registry().flush().unwrap();

        let read = |rel: &str| std::fs::read_to_string(dir.path().join(rel)).unwrap();

        let access = read("http/web.http.access.log");
        assert_eq!(access.lines().count(), 2);
        assert!(access.lines().next().unwrap().starts_with("1.2.3.4 - - ["));

        let errors = read("http/web.http.err.log");
        assert_eq!(errors.lines().count(), 1);
        assert!(errors.contains("\"GET /missing HTTP/1.1\" 404 0"));

        let json_errors = read("json.http/web.json.http.err.log");
        let value: serde_json::Value = serde_json::from_str(json_errors.trim()).unwrap();
        assert_eq!(value["status_code"], 404);
        assert!(read("json.http/web.json.http.access.log").lines().count() == 2);
    }

    #[test]
    fn test_log_access_level_and_message() {
        use crate::core::formatter::{Formatter, TemplateFormatter};
        use crate::core::registry::{SinkDescriptor, SinkRegistry};
        use crate::sinks::{IoWriter, SharedBuffer};

        let registry = std::sync::Arc::new(SinkRegistry::new());
        let buffer = SharedBuffer::new();
        registry
            .add(SinkDescriptor::new(
                "CAPTURE",
                Box::new(IoWriter::new(buffer.clone())),
                Formatter::Template(TemplateFormatter::new("{level} {message}").unwrap()),
            ))
            .unwrap();
        let logger = Logger::new(registry);

        let report = log_access(&logger, &HttpInfo::new("DELETE", "/x", 502).with_request_id("r9"));
        assert_eq!(report.delivered, 1);
        assert_eq!(
            buffer.lines(),
            vec!["ERROR [r9] - - \"DELETE /x HTTP/1.1\" 502 0B 0ms"]
        );
    }
}
