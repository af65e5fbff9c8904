//! Formatters for HTTP access sinks
//!
//! Both formatters skip records without `http_info`, so an access sink
//! attached without [`http_filter`](super::http_filter) stays clean.

use super::info::HttpInfo;
use crate::core::{formatter::Formatter, record::LogRecord, timestamp::TimestampFormat};
use chrono::{DateTime, Local};

/// Combined-log style line for one request
///
/// `client_host request_id user_id [datetime] "method url_path HTTP/version" status content_length "referer" "user_agent" response_time`
pub fn access_line(info: &HttpInfo, time: &DateTime<Local>) -> String {
    let datetime = info
        .datetime
        .clone()
        .unwrap_or_else(|| TimestampFormat::Iso8601.format(time));

    format!(
        "{} {} {} [{}] \"{} {} HTTP/{}\" {} {} \"{}\" \"{}\" {}",
        info.client_host,
        info.request_id,
        info.user_id,
        datetime,
        info.method,
        info.url_path,
        info.http_version,
        info.status_code,
        info.content_length.unwrap_or(0),
        info.h_referer.as_deref().unwrap_or("-"),
        info.h_user_agent.as_deref().unwrap_or("-"),
        info.response_time.unwrap_or(0.0)
    )
}

/// The request metadata as one JSON object, `datetime` filled in
pub fn access_json(info: &HttpInfo, time: &DateTime<Local>) -> Option<String> {
    let mut info = info.clone();
    info.datetime
        .get_or_insert_with(|| TimestampFormat::Iso8601.format(time));
    serde_json::to_string(&info).ok()
}

pub fn access_formatter() -> Formatter {
    Formatter::custom(|record: &LogRecord| {
        HttpInfo::from_record(record).map(|info| access_line(&info, record.time()))
    })
}

pub fn access_json_formatter() -> Formatter {
    Formatter::custom(|record: &LogRecord| {
        HttpInfo::from_record(record).and_then(|info| access_json(&info, record.time()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{extra::FieldValue, filter::HTTP_INFO_KEY, log_level::LogLevel};
    use chrono::TimeZone;

    fn info() -> HttpInfo {
        HttpInfo::new("GET", "/items?page=2", 200)
            .with_request_id("a1b2")
            .with_client_host("192.168.1.7")
            .with_user_id("42")
    }

    #[test]
    fn test_access_line_defaults() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 8, 15, 0).unwrap();
        let line = access_line(&info(), &time);

        let expected = format!(
            "192.168.1.7 a1b2 42 [{}] \"GET /items?page=2 HTTP/1.1\" 200 0 \"-\" \"-\" 0",
            TimestampFormat::Iso8601.format(&time)
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_access_line_full() {
        let time = Local::now();
        let info = info()
            .with_datetime("2024-03-09T08:15:00+00:00")
            .with_content_length(1024)
            .with_referer("https://example.com/")
            .with_user_agent("Mozilla/5.0")
            .with_response_time(3.2);

        assert_eq!(
            access_line(&info, &time),
            "192.168.1.7 a1b2 42 [2024-03-09T08:15:00+00:00] \"GET /items?page=2 HTTP/1.1\" 200 1024 \"https://example.com/\" \"Mozilla/5.0\" 3.2"
        );
    }

    #[test]
    fn test_formatters_skip_plain_records() {
        let record = LogRecord::new(LogLevel::Info, "plain");
        assert!(access_formatter().format(&record).unwrap().text.is_none());
        assert!(access_json_formatter().format(&record).unwrap().text.is_none());
    }

    #[test]
    fn test_json_formatter_fills_datetime() {
        let record = LogRecord::new(LogLevel::Success, "ok")
            .with_field(HTTP_INFO_KEY, FieldValue::from(&info()));

        let text = access_json_formatter().format(&record).unwrap().text.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status_code"], 200);
        assert_eq!(value["url_path"], "/items?page=2");
        assert_eq!(
            value["datetime"],
            TimestampFormat::Iso8601.format(record.time())
        );
    }
}
