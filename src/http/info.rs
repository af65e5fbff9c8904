//! HTTP request metadata carried in a record's `http_info` extra

use crate::core::{extra::FieldValue, filter::HTTP_INFO_KEY, log_level::LogLevel, record::LogRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn dash() -> String {
    "-".to_string()
}

fn default_http_version() -> String {
    "1.1".to_string()
}

/// One served request
///
/// Optional fields fall back to their access-line defaults when rendered:
/// `datetime` to the record time, `content_length` and `response_time` to
/// `0`, referer and user agent to `-`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpInfo {
    #[serde(default = "dash")]
    pub request_id: String,
    #[serde(default = "dash")]
    pub client_host: String,
    #[serde(default = "dash")]
    pub user_id: String,
    pub method: String,
    pub url_path: String,
    #[serde(default = "default_http_version")]
    pub http_version: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_user_agent: Option<String>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    /// Anything else the caller attached
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HttpInfo {
    pub fn new(method: impl Into<String>, url_path: impl Into<String>, status_code: u16) -> Self {
        Self {
            request_id: dash(),
            client_host: dash(),
            user_id: dash(),
            method: method.into(),
            url_path: url_path.into(),
            http_version: default_http_version(),
            status_code,
            content_length: None,
            h_referer: None,
            h_user_agent: None,
            response_time: None,
            datetime: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn with_client_host(mut self, client_host: impl Into<String>) -> Self {
        self.client_host = client_host.into();
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    #[must_use]
    pub fn with_http_version(mut self, version: impl Into<String>) -> Self {
        self.http_version = version.into();
        self
    }

    #[must_use]
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.h_referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.h_user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_response_time(mut self, millis: f64) -> Self {
        self.response_time = Some(millis);
        self
    }

    #[must_use]
    pub fn with_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }

    /// Level an access record is logged at, by status class
    pub fn level(&self) -> LogLevel {
        match self.status_code {
            0..=199 => LogLevel::Debug,
            200..=299 => LogLevel::Success,
            300..=399 => LogLevel::Info,
            400..=499 => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }

    /// Human-readable message for the console and plain file sinks
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} {} \"{} {} HTTP/{}\" {} {}B {}ms",
            self.request_id,
            self.client_host,
            self.user_id,
            self.method,
            self.url_path,
            self.http_version,
            self.status_code,
            self.content_length.unwrap_or(0),
            self.response_time.unwrap_or(0.0)
        )
    }

    /// Metadata attached to `record`, if any and well-formed
    pub fn from_record(record: &LogRecord) -> Option<Self> {
        let field = record.extra().get(HTTP_INFO_KEY)?;
        let mut lossy = Vec::new();
        serde_json::from_value(field.to_json_lossy(HTTP_INFO_KEY, &mut lossy)).ok()
    }
}

impl From<&HttpInfo> for FieldValue {
    fn from(info: &HttpInfo) -> Self {
        match serde_json::to_value(info) {
            Ok(value) => FieldValue::from(value),
            Err(_) => FieldValue::Null,
        }
    }
}
