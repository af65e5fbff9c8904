//! Logger configuration
//!
//! [`LoggerConfig`] is the whole configuration tree. Every field has a
//! default, so a configuration file only lists what it changes:
//!
//! ```yaml
//! logger:
//!   app_name: billing
//!   level: DEBUG
//!   file:
//!     rotate_size: 5000000
//!     log_handlers:
//!       enabled: true
//! ```
//!
//! Files and patches are applied with [`deep_merge`]: nested maps merge
//! key by key, anything else is replaced by the patch.

use crate::core::{
    error::{LoggerError, Result},
    extra::Extra,
    log_level::LogLevel,
    record::ProcessInfo,
    template::Template,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default stream template
pub const DEFAULT_STREAM_FORMAT: &str = "[<c>{time:YYYY-MM-DD HH:mm:ss.SSS Z}</c> | <level>{level_short:<5}</level> | <w>{name}:{line}</w>]: <level>{message}</level>";

/// Default plain-text file template
pub const DEFAULT_FILE_FORMAT: &str =
    "[{time:YYYY-MM-DD HH:mm:ss.SSS Z} | {level_short:<5} | {name}:{line}]: {message}";

/// Top-level document key holding the logger configuration
pub const CONFIG_ROOT_KEY: &str = "logger";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub app_name: String,
    pub level: LogLevel,
    pub use_backtrace: bool,
    pub use_diagnose: bool,
    pub stream: StreamConfig,
    pub file: FileConfig,
    pub intercept: InterceptConfig,
    /// Fields bound to every record emitted through the loader's logger
    pub extra: Extra,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            app_name: ProcessInfo::current().name,
            level: LogLevel::Info,
            use_backtrace: true,
            use_diagnose: false,
            stream: StreamConfig::default(),
            file: FileConfig::default(),
            intercept: InterceptConfig::default(),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub use_color: bool,
    pub use_icon: bool,
    pub format_str: String,
    pub std_handler: StdHandlerConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            use_icon: false,
            format_str: DEFAULT_STREAM_FORMAT.to_string(),
            std_handler: StdHandlerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdHandlerConfig {
    pub enabled: bool,
}

impl Default for StdHandlerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub logs_dir: PathBuf,
    pub rotate_size: u64,
    #[serde(with = "time_of_day")]
    pub rotate_time: NaiveTime,
    pub backup_count: usize,
    pub encoding: String,
    /// Gzip archives after rotation
    pub compress: bool,
    pub log_handlers: LogHandlersConfig,
    pub json_handlers: JsonHandlersConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            logs_dir: default_logs_dir(),
            rotate_size: 10_000_000,
            rotate_time: NaiveTime::MIN,
            backup_count: 90,
            encoding: "utf8".to_string(),
            compress: false,
            log_handlers: LogHandlersConfig::default(),
            json_handlers: JsonHandlersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogHandlersConfig {
    pub enabled: bool,
    pub format_str: String,
    pub log_path: String,
    pub err_path: String,
}

impl Default for LogHandlersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            format_str: DEFAULT_FILE_FORMAT.to_string(),
            log_path: "{app_name}.std.all.log".to_string(),
            err_path: "{app_name}.std.err.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonHandlersConfig {
    pub enabled: bool,
    /// Write the compact JSON line instead of the full serialized record
    pub use_custom: bool,
    pub log_path: String,
    pub err_path: String,
}

impl Default for JsonHandlersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_custom: false,
            log_path: "{app_name}.json.all.log".to_string(),
            err_path: "{app_name}.json.err.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    pub auto_load: AutoLoadConfig,
    pub include_modules: Vec<String>,
    pub mute_modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLoadConfig {
    pub enabled: bool,
    pub only_base: bool,
    pub ignore_modules: Vec<String>,
}

impl Default for AutoLoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            only_base: false,
            ignore_modules: Vec::new(),
        }
    }
}

fn default_logs_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs")
}

impl LoggerConfig {
    /// Load the `logger` section of a YAML or JSON file over the defaults
    ///
    /// # Errors
    ///
    /// [`LoggerError::ConfigLoad`] when the file cannot be read or parsed,
    /// has an unsupported extension, lacks the `logger` section, or does
    /// not validate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let document = read_document(path).map_err(|e| LoggerError::config_load(&shown, e))?;
        let section = match document {
            Value::Object(mut map) => map.remove(CONFIG_ROOT_KEY),
            _ => None,
        }
        .ok_or_else(|| {
            LoggerError::config_load(&shown, format!("missing '{}' section", CONFIG_ROOT_KEY))
        })?;

        Self::default()
            .merged(&section)
            .map_err(|e| LoggerError::config_load(&shown, e.to_string()))
    }

    /// Deep-merge `patch` over this configuration and validate the result
    pub fn merged(&self, patch: &Value) -> Result<Self> {
        let base = serde_json::to_value(self)?;
        Self::from_value(deep_merge(&base, patch))
    }

    /// Build from a complete or partial JSON tree; missing keys take defaults
    pub fn from_value(value: Value) -> Result<Self> {
        let mut config: LoggerConfig = serde_json::from_value(value)
            .map_err(|e| LoggerError::config("config", e.to_string()))?;
        config.trim_strings();
        config.validate()?;
        Ok(config)
    }

    fn trim_strings(&mut self) {
        fn trim(s: &mut String) {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }

        trim(&mut self.app_name);
        trim(&mut self.stream.format_str);
        trim(&mut self.file.encoding);
        trim(&mut self.file.log_handlers.format_str);
        trim(&mut self.file.log_handlers.log_path);
        trim(&mut self.file.log_handlers.err_path);
        trim(&mut self.file.json_handlers.log_path);
        trim(&mut self.file.json_handlers.err_path);
    }

    /// Check field ranges, path pairs, the encoding and both templates
    pub fn validate(&self) -> Result<()> {
        check_len("app_name", &self.app_name, 1, 127)?;
        check_len("stream.format_str", &self.stream.format_str, 3, 511)?;
        check_len("file.log_handlers.format_str", &self.file.log_handlers.format_str, 4, 511)?;

        if self.file.logs_dir.as_os_str().len() < 2 {
            return Err(LoggerError::config(
                "file.logs_dir",
                format!("'{}' is too short", self.file.logs_dir.display()),
            ));
        }

        if !(1_000..1_000_000_000).contains(&self.file.rotate_size) {
            return Err(LoggerError::config(
                "file.rotate_size",
                format!(
                    "{} is out of range, must be >= 1000 and < 1000000000",
                    self.file.rotate_size
                ),
            ));
        }

        if self.file.backup_count < 1 {
            return Err(LoggerError::config("file.backup_count", "must be at least 1"));
        }

        if !is_utf8_label(&self.file.encoding) {
            return Err(LoggerError::config(
                "file.encoding",
                format!("'{}' is not supported, only UTF-8 is", self.file.encoding),
            ));
        }

        check_paths(
            "file.log_handlers",
            &self.file.log_handlers.log_path,
            &self.file.log_handlers.err_path,
        )?;
        check_paths(
            "file.json_handlers",
            &self.file.json_handlers.log_path,
            &self.file.json_handlers.err_path,
        )?;

        Template::compile(&self.stream.format_str)?;
        Template::compile(&self.file.log_handlers.format_str)?;
        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(LoggerError::config(
            field,
            format!("length {} is out of range {}..={}", len, min, max),
        ));
    }
    Ok(())
}

fn check_paths(group: &str, log_path: &str, err_path: &str) -> Result<()> {
    check_len(&format!("{}.log_path", group), log_path, 4, 1023)?;
    check_len(&format!("{}.err_path", group), err_path, 4, 1023)?;
    if log_path == err_path {
        return Err(LoggerError::config(
            group,
            format!("`log_path` and `err_path` are the same: '{}', must be different", log_path),
        ));
    }
    Ok(())
}

fn is_utf8_label(encoding: &str) -> bool {
    matches!(encoding.to_ascii_lowercase().as_str(), "utf8" | "utf-8" | "utf_8")
}

fn read_document(path: &Path) -> std::result::Result<Value, String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match extension.as_str() {
        "yml" | "yaml" => serde_yaml::from_str(&raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(&raw).map_err(|e| e.to_string()),
        other => Err(format!(
            "unsupported format '{}', expected .yml, .yaml or .json",
            other
        )),
    }
}

/// Recursively merge `patch` into a copy of `base`
///
/// Objects merge key by key; any other value in `patch`, including arrays
/// and `null`, replaces the one in `base`.
pub fn deep_merge(base: &Value, patch: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, patch);
    merged
}

fn merge_into(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_into(existing, value)
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// `rotate_time` as `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S%.f").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid rotate_time '{}', expected HH:MM, HH:MM:SS or HH:MM:SS.fff",
                raw
            ))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
    }
}
