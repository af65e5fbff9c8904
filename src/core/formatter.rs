//! Output formats for log records
//!
//! Provides the formats a sink can render records in:
//! - `Template`: plain text from a [`Template`], optionally colourized
//! - `Json`: one compact JSON object per line with a fixed key order
//! - `Serialized`: the template line plus the full record as JSON
//! - `Custom`: a caller closure; returning `None` skips the record

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::record::LogRecord;
use super::template::Template;
use super::timestamp::{format_elapsed, unix_seconds, TimestampFormat};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Output of a formatter for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Line to write, without the trailing newline; `None` skips the sink
    pub text: Option<String>,
    /// Extra field paths whose values had no JSON form and were written as `null`
    pub lossy: Vec<String>,
}

impl Rendered {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            lossy: Vec::new(),
        }
    }

    pub fn skip() -> Self {
        Self::default()
    }
}

/// Plain text formatter built from a template
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    template: Arc<Template>,
    colorize: bool,
    backtrace: bool,
    diagnose: bool,
}

impl TemplateFormatter {
    /// Compile `source`; unknown fields fail here rather than at dispatch
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            template: Arc::new(Template::compile(source)?),
            colorize: false,
            backtrace: true,
            diagnose: false,
        })
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Include the full traceback of a captured error
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: bool) -> Self {
        self.backtrace = backtrace;
        self
    }

    /// Include the record's extra fields below a captured error
    #[must_use]
    pub fn with_diagnose(mut self, diagnose: bool) -> Self {
        self.diagnose = diagnose;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    pub fn render(&self, record: &LogRecord) -> String {
        let mut line = self.template.render(record, self.colorize);

        if let Some(error) = record.error() {
            line.push('\n');
            if self.backtrace {
                line.push_str(&error.traceback);
            } else {
                line.push_str(&format!("{}: {}", error.type_name, error.value));
            }
            if self.diagnose && !record.extra().is_empty() {
                line.push_str(&format!("\n  with extra: {}", record.extra()));
            }
        }
        line
    }
}

type CustomFn = dyn Fn(&LogRecord) -> Option<String> + Send + Sync;

#[derive(Clone)]
pub enum Formatter {
    Template(TemplateFormatter),
    Json,
    Serialized(TemplateFormatter),
    Custom(Arc<CustomFn>),
}

impl Formatter {
    pub fn custom<F>(format: F) -> Self
    where
        F: Fn(&LogRecord) -> Option<String> + Send + Sync + 'static,
    {
        Formatter::Custom(Arc::new(format))
    }

    pub fn format(&self, record: &LogRecord) -> Result<Rendered> {
        match self {
            Formatter::Template(template) => Ok(Rendered::line(template.render(record))),
            Formatter::Json => format_json_line(record),
            Formatter::Serialized(template) => format_serialized(template, record),
            Formatter::Custom(format) => Ok(Rendered {
                text: format(record),
                lossy: Vec::new(),
            }),
        }
    }

    /// Short name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Formatter::Template(_) => "template",
            Formatter::Json => "json",
            Formatter::Serialized(_) => "serialized",
            Formatter::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formatter::Template(t) => f.debug_tuple("Template").field(&t.template.source()).finish(),
            Formatter::Serialized(t) => f
                .debug_tuple("Serialized")
                .field(&t.template.source())
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Serialize)]
struct NameId<'a, I> {
    name: &'a str,
    id: I,
}

#[derive(Serialize)]
struct JsonError<'a> {
    #[serde(rename = "type")]
    type_name: &'a str,
    value: &'a str,
    traceback: &'a str,
}

/// Key order of a JSON log line
#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    level: LogLevel,
    level_no: u8,
    file: &'a str,
    line: u32,
    name: &'a str,
    process: NameId<'a, u32>,
    thread_name: NameId<'a, u64>,
    message: &'a str,
    extra: Option<serde_json::Value>,
    error: Option<JsonError<'a>>,
    elapsed: String,
}

fn format_json_line(record: &LogRecord) -> Result<Rendered> {
    let mut lossy = Vec::new();
    let extra = if record.extra().is_empty() {
        None
    } else {
        Some(record.extra().to_json_lossy(&mut lossy))
    };

    let line = JsonLine {
        timestamp: TimestampFormat::IsoSeconds.format(record.time()),
        level: record.level(),
        level_no: record.level().no(),
        file: record.location().file_name(),
        line: record.location().line,
        name: record.name(),
        process: NameId {
            name: &record.process().name,
            id: record.process().id,
        },
        thread_name: NameId {
            name: &record.thread().name,
            id: record.thread().id,
        },
        message: record.message(),
        extra,
        error: record.error().map(|error| JsonError {
            type_name: &error.type_name,
            value: &error.value,
            traceback: &error.traceback,
        }),
        elapsed: format_elapsed(record.elapsed()),
    };

    Ok(Rendered {
        text: Some(
            serde_json::to_string(&line)
                .map_err(|e| LoggerError::formatter("json", e.to_string()))?,
        ),
        lossy,
    })
}

#[derive(Serialize)]
struct Elapsed {
    repr: String,
    seconds: f64,
}

#[derive(Serialize)]
struct FileRef<'a> {
    name: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct LevelRef {
    icon: &'static str,
    name: &'static str,
    no: u8,
}

#[derive(Serialize)]
struct IdName<'a, I> {
    id: I,
    name: &'a str,
}

#[derive(Serialize)]
struct TimeRef {
    repr: String,
    timestamp: f64,
}

#[derive(Serialize)]
struct SerializedRecord<'a> {
    elapsed: Elapsed,
    exception: Option<JsonError<'a>>,
    extra: serde_json::Value,
    file: FileRef<'a>,
    function: &'a str,
    level: LevelRef,
    line: u32,
    message: &'a str,
    module: &'a str,
    name: &'a str,
    process: IdName<'a, u32>,
    thread: IdName<'a, u64>,
    time: TimeRef,
}

#[derive(Serialize)]
struct Serialized<'a> {
    text: String,
    record: SerializedRecord<'a>,
}

fn format_serialized(template: &TemplateFormatter, record: &LogRecord) -> Result<Rendered> {
    let mut lossy = Vec::new();
    let location = record.location();

    let serialized = Serialized {
        text: template.render(record),
        record: SerializedRecord {
            elapsed: Elapsed {
                repr: format_elapsed(record.elapsed()),
                seconds: record.elapsed().as_secs_f64(),
            },
            exception: record.error().map(|error| JsonError {
                type_name: &error.type_name,
                value: &error.value,
                traceback: &error.traceback,
            }),
            extra: record.extra().to_json_lossy(&mut lossy),
            file: FileRef {
                name: location.file_name(),
                path: &location.file,
            },
            function: location.function.as_deref().unwrap_or(""),
            level: LevelRef {
                icon: record.level().icon(),
                name: record.level().to_str(),
                no: record.level().no(),
            },
            line: location.line,
            message: record.message(),
            module: location.module_name(),
            name: record.name(),
            process: IdName {
                id: record.process().id,
                name: &record.process().name,
            },
            thread: IdName {
                id: record.thread().id,
                name: &record.thread().name,
            },
            time: TimeRef {
                repr: TimestampFormat::Iso8601.format(record.time()),
                timestamp: unix_seconds(record.time()),
            },
        },
    };

    Ok(Rendered {
        text: Some(
            serde_json::to_string(&serialized)
                .map_err(|e| LoggerError::formatter("serialized", e.to_string()))?,
        ),
        lossy,
    })
}
