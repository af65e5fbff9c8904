//! Configuration-driven sink setup
//!
//! [`LoggerLoader`] owns the active [`LoggerConfig`] and the
//! [`SinkRegistry`]. Calling [`load`](LoggerLoader::load) rebuilds the
//! default sinks from the configuration:
//!
//! | Name            | Enabled by                      | Level   | Target                    |
//! |-----------------|---------------------------------|---------|---------------------------|
//! | `STREAM.STD`    | `stream.std_handler.enabled`    | config  | console                   |
//! | `FILE`          | `file.log_handlers.enabled`     | config  | `log_handlers.log_path`   |
//! | `FILE_ERR`      | `file.log_handlers.enabled`     | WARNING | `log_handlers.err_path`   |
//! | `FILE.JSON`     | `file.json_handlers.enabled`    | config  | `json_handlers.log_path`  |
//! | `FILE.JSON_ERR` | `file.json_handlers.enabled`    | WARNING | `json_handlers.err_path`  |
//!
//! Extra sinks are added with [`add_handler`](LoggerLoader::add_handler);
//! options left unset are filled in from the configuration according to
//! the name prefix (`STREAM*` or `FILE*`).

use crate::config::{deep_merge, LoggerConfig};
use crate::core::{
    error::{LoggerError, Result},
    filter::{Filter, SinkClass},
    formatter::{Formatter, TemplateFormatter},
    log_level::LogLevel,
    logger::Logger,
    registry::{normalize_name, ErrorCallback, HandlerRef, SinkDescriptor, SinkId, SinkRegistry},
    rotation::{RetentionPolicy, RotationPolicy},
    writer::SinkWriter,
};
use crate::env::EnvOverrides;
use crate::intercept::{InterceptRules, Interceptor};
use crate::sinks::{ConsoleTarget, ConsoleWriter, QueuedWriter, RotatingFileWriter};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_CONFIGS_DIR: &str = "configs";
pub const DEFAULT_CONFIG_FILENAME: &str = "logger.yml";

/// Where a sink writes
pub enum SinkTarget {
    Console(ConsoleTarget),
    /// File path; relative paths are resolved against `file.logs_dir` and
    /// `{app_name}` is substituted
    Path(String),
    Writer(Box<dyn SinkWriter>),
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Console(target) => f.debug_tuple("Console").field(target).finish(),
            SinkTarget::Path(path) => f.debug_tuple("Path").field(path).finish(),
            SinkTarget::Writer(writer) => f.debug_tuple("Writer").field(&writer.kind()).finish(),
        }
    }
}

/// Options for [`LoggerLoader::add_handler`]; unset fields take defaults
#[derive(Debug, Default)]
pub struct SinkOptions {
    pub target: Option<SinkTarget>,
    pub level: Option<LogLevel>,
    pub filter: Option<Filter>,
    /// Replaces the template built from `format`
    pub formatter: Option<Formatter>,
    /// Template source
    pub format: Option<String>,
    pub colorize: Option<bool>,
    pub backtrace: Option<bool>,
    pub diagnose: Option<bool>,
    pub rotation: Option<RotationPolicy>,
    pub retention: Option<RetentionPolicy>,
    pub encoding: Option<String>,
    /// Write on a background worker; always on for `FILE*` sinks
    pub enqueue: Option<bool>,
}

impl SinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(mut self, target: SinkTarget) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn path(self, path: impl Into<String>) -> Self {
        self.target(SinkTarget::Path(path.into()))
    }

    #[must_use]
    pub fn writer(self, writer: Box<dyn SinkWriter>) -> Self {
        self.target(SinkTarget::Writer(writer))
    }

    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.format = Some(template.into());
        self
    }

    #[must_use]
    pub fn colorize(mut self, enabled: bool) -> Self {
        self.colorize = Some(enabled);
        self
    }

    #[must_use]
    pub fn backtrace(mut self, enabled: bool) -> Self {
        self.backtrace = Some(enabled);
        self
    }

    #[must_use]
    pub fn diagnose(mut self, enabled: bool) -> Self {
        self.diagnose = Some(enabled);
        self
    }

    #[must_use]
    pub fn rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = Some(rotation);
        self
    }

    #[must_use]
    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn enqueue(mut self, enabled: bool) -> Self {
        self.enqueue = Some(enabled);
        self
    }
}

/// Builder for [`LoggerLoader`]
///
/// The configuration is assembled in this order: defaults, then the
/// configuration file, then [`config_object`](Self::config_object) (which
/// replaces everything), then [`config`](Self::config) patches, deep-merged.
#[must_use]
pub struct LoggerLoaderBuilder {
    configs_dir: PathBuf,
    config_filename: String,
    config_path: Option<PathBuf>,
    load_config_file: bool,
    patches: Vec<Value>,
    config_object: Option<LoggerConfig>,
    env: Option<EnvOverrides>,
    on_error: Option<ErrorCallback>,
    auto_load: bool,
}

impl Default for LoggerLoaderBuilder {
    fn default() -> Self {
        Self {
            configs_dir: std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIGS_DIR),
            config_filename: DEFAULT_CONFIG_FILENAME.to_string(),
            config_path: None,
            load_config_file: true,
            patches: Vec::new(),
            config_object: None,
            env: None,
            on_error: None,
            auto_load: false,
        }
    }
}

impl LoggerLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.configs_dir = dir.into();
        self
    }

    pub fn config_filename(mut self, filename: impl Into<String>) -> Self {
        self.config_filename = filename.into();
        self
    }

    /// Explicit configuration file; must exist
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn load_config_file(mut self, enabled: bool) -> Self {
        self.load_config_file = enabled;
        self
    }

    /// Deep-merge a partial configuration; may be called repeatedly
    pub fn config(mut self, patch: Value) -> Self {
        self.patches.push(patch);
        self
    }

    /// Start from a complete configuration instead of the file
    pub fn config_object(mut self, config: LoggerConfig) -> Self {
        self.config_object = Some(config);
        self
    }

    /// Environment to use instead of the process environment
    pub fn env(mut self, env: EnvOverrides) -> Self {
        self.env = Some(env);
        self
    }

    /// Receive every sink failure reported during dispatch
    ///
    /// The callback runs after the sink list lock is released, so it may
    /// add or remove sinks.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&crate::core::registry::SinkIssue) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Call [`LoggerLoader::load`] at the end of [`build`](Self::build)
    pub fn auto_load(mut self, enabled: bool) -> Self {
        self.auto_load = enabled;
        self
    }

    /// # Errors
    ///
    /// [`LoggerError::ConfigLoad`] if the configuration file is unusable,
    /// [`LoggerError::InvalidConfiguration`] if a patch does not validate,
    /// or any sink registration error when `auto_load` is set.
    pub fn build(self) -> Result<LoggerLoader> {
        let env = self.env.unwrap_or_else(EnvOverrides::from_env);

        let mut config = LoggerConfig::default();
        if self.load_config_file {
            let explicit = env.config_path.clone().or(self.config_path);
            match explicit {
                Some(path) => config = LoggerConfig::from_file(&path)?,
                None => {
                    let path = self.configs_dir.join(&self.config_filename);
                    check_config_extension(&path)?;
                    if path.is_file() {
                        config = LoggerConfig::from_file(&path)?;
                    }
                }
            }
        }

        if let Some(object) = self.config_object {
            object.validate()?;
            config = object;
        }

        for patch in &self.patches {
            config = config.merged(patch)?;
        }

        let registry = Arc::new(SinkRegistry::with_error_callback(self.on_error));
        let interceptor = Arc::new(Interceptor::new(
            Logger::new(Arc::clone(&registry)),
            InterceptRules::from_config(&config.intercept),
        ));

        let loader = LoggerLoader {
            config: RwLock::new(Arc::new(config)),
            registry,
            interceptor,
            env,
            intercept_installed: AtomicBool::new(false),
        };

        if self.auto_load {
            loader.load()?;
        }
        Ok(loader)
    }
}

fn check_config_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "yml" | "yaml" | "json" => Ok(()),
        "toml" => Err(LoggerError::config_load(
            path.display().to_string(),
            "TOML configuration files are not supported",
        )),
        _ => Err(LoggerError::config_load(
            path.display().to_string(),
            "configuration file must have a .yml, .yaml or .json extension",
        )),
    }
}

/// Owns the configuration and the sinks built from it
///
/// # Example
///
/// ```no_run
/// use rust_log_loader::loader::LoggerLoader;
/// use serde_json::json;
///
/// let loader = LoggerLoader::builder()
///     .config(json!({"app_name": "api", "file": {"log_handlers": {"enabled": true}}}))
///     .build()?;
/// let logger = loader.load()?;
/// logger.info("service started");
/// # Ok::<(), rust_log_loader::core::LoggerError>(())
/// ```
pub struct LoggerLoader {
    config: RwLock<Arc<LoggerConfig>>,
    registry: Arc<SinkRegistry>,
    interceptor: Arc<Interceptor>,
    env: EnvOverrides,
    intercept_installed: AtomicBool,
}

impl LoggerLoader {
    pub fn builder() -> LoggerLoaderBuilder {
        LoggerLoaderBuilder::new()
    }

    /// Rebuild every sink from the configuration
    ///
    /// Existing sinks are removed first. Environment overrides are applied
    /// to the stored configuration, the default sinks are registered, and
    /// the `log` facade is pointed at this loader's registry.
    pub fn load(&self) -> Result<Logger> {
        self.registry.remove_all();

        let config = {
            let mut slot = self.config.write();
            let effective = Arc::new(self.env.apply((**slot).clone()));
            *slot = Arc::clone(&effective);
            effective
        };

        if config.stream.std_handler.enabled {
            self.add_handler(
                "STREAM.STD",
                SinkOptions::new().filter(Filter::for_class(SinkClass::Std)),
            )?;
        }

        if config.file.log_handlers.enabled {
            self.add_handler(
                "FILE",
                SinkOptions::new().filter(Filter::for_class(SinkClass::File)),
            )?;
            self.add_handler(
                "FILE_ERR",
                SinkOptions::new()
                    .path(config.file.log_handlers.err_path.clone())
                    .level(LogLevel::Warning)
                    .filter(Filter::for_class(SinkClass::FileErr)),
            )?;
        }

        if config.file.json_handlers.enabled {
            self.add_handler(
                "FILE.JSON",
                SinkOptions::new()
                    .path(config.file.json_handlers.log_path.clone())
                    .filter(Filter::for_class(SinkClass::FileJson))
                    .formatter(self.json_formatter(&config)?),
            )?;
            self.add_handler(
                "FILE.JSON_ERR",
                SinkOptions::new()
                    .path(config.file.json_handlers.err_path.clone())
                    .level(LogLevel::Warning)
                    .filter(Filter::for_class(SinkClass::FileJsonErr))
                    .formatter(self.json_formatter(&config)?),
            )?;
        }

        let logger = self.logger();
        self.load_intercept(&config, &logger);
        Ok(logger)
    }

    fn json_formatter(&self, config: &LoggerConfig) -> Result<Formatter> {
        if config.file.json_handlers.use_custom {
            return Ok(Formatter::Json);
        }
        Ok(Formatter::Serialized(
            TemplateFormatter::new(&config.file.log_handlers.format_str)?
                .with_backtrace(config.use_backtrace)
                .with_diagnose(config.use_diagnose),
        ))
    }

    fn load_intercept(&self, config: &LoggerConfig, logger: &Logger) {
        let rules = InterceptRules::from_config(&config.intercept);
        let summary = rules.summary();
        self.interceptor.set_rules(rules);
        self.interceptor.set_logger(logger.clone());

        if !self.intercept_installed.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.interceptor.install() {
                eprintln!(
                    "[LOGGER WARNING] {}. Records from the log facade will not reach this logger.",
                    e
                );
            }
        }

        logger.trace(summary);
    }

    /// Register a sink, filling unset options from the configuration
    ///
    /// # Errors
    ///
    /// - [`LoggerError::DuplicateName`] if the normalized name is taken
    /// - [`LoggerError::InvalidConfiguration`] if no target can be derived,
    ///   the template does not compile, or the encoding is not UTF-8
    /// - [`LoggerError::DirectoryCreation`] / [`LoggerError::FileAppender`]
    ///   if the log file cannot be opened
    pub fn add_handler(&self, name: &str, options: SinkOptions) -> Result<SinkId> {
        let name = normalize_name(name);
        if self.registry.contains(&name) {
            return Err(LoggerError::duplicate_name(name));
        }

        let config = self.config();
        let level = options.level.unwrap_or(config.level);
        let filter = options.filter.unwrap_or_default();
        let backtrace = options.backtrace.unwrap_or(config.use_backtrace);
        let diagnose = options.diagnose.unwrap_or(config.use_diagnose);

        let mut target = options.target;
        let mut format = options.format;
        let mut colorize = options.colorize;
        let mut rotation = options.rotation;
        let mut retention = options.retention;
        let mut encoding = options.encoding;
        let mut enqueue = options.enqueue.unwrap_or(false);

        if name.starts_with("STREAM") {
            target.get_or_insert(SinkTarget::Console(ConsoleTarget::Split));
            format.get_or_insert_with(|| config.stream.format_str.clone());
            colorize.get_or_insert(config.stream.use_color);
        } else if name.starts_with("FILE") {
            enqueue = true;
            target.get_or_insert_with(|| SinkTarget::Path(config.file.log_handlers.log_path.clone()));
            format.get_or_insert_with(|| config.file.log_handlers.format_str.clone());
            rotation.get_or_insert_with(|| {
                RotationPolicy::new(Some(config.file.rotate_size), Some(config.file.rotate_time))
            });
            retention.get_or_insert_with(|| {
                RetentionPolicy::new(config.file.backup_count)
                    .with_compression(config.file.compress)
            });
            encoding.get_or_insert_with(|| config.file.encoding.clone());
        }

        let target = target.ok_or_else(|| {
            LoggerError::config(
                "handler",
                format!("A target is required for custom handler '{}'", name),
            )
        })?;

        if let Some(ref encoding) = encoding {
            let lowered = encoding.trim().to_ascii_lowercase();
            if !matches!(lowered.as_str(), "utf8" | "utf-8" | "utf_8") {
                return Err(LoggerError::config(
                    "encoding",
                    format!("'{}' is not supported for handler '{}'", encoding, name),
                ));
            }
        }

        let formatter = match options.formatter {
            Some(formatter) => formatter,
            None => {
                let source = format.unwrap_or_else(|| config.file.log_handlers.format_str.clone());
                Formatter::Template(
                    TemplateFormatter::new(&source)?
                        .with_colorize(colorize.unwrap_or(false))
                        .with_backtrace(backtrace)
                        .with_diagnose(diagnose),
                )
            }
        };

        let writer: Box<dyn SinkWriter> = match target {
            SinkTarget::Console(console) => Box::new(ConsoleWriter::with_target(console)),
            SinkTarget::Writer(writer) => writer,
            SinkTarget::Path(path) => {
                let path = self.resolve_path(&config, &path);
                Box::new(
                    RotatingFileWriter::new(
                        &path,
                        rotation.unwrap_or_default(),
                        retention.unwrap_or_default(),
                    )?
                    .with_metrics(Arc::clone(self.registry.metrics())),
                )
            }
        };

        let writer: Box<dyn SinkWriter> = if enqueue {
            Box::new(QueuedWriter::spawn(
                name.clone(),
                writer,
                self.registry.reporter().clone(),
            )?)
        } else {
            writer
        };

        self.registry.add(
            SinkDescriptor::new(name, writer, formatter)
                .with_level(level)
                .with_filter(filter),
        )
    }

    /// Absolute path for a sink target: `{app_name}` substituted, relative
    /// paths placed under `file.logs_dir`
    pub fn resolve_path(&self, config: &LoggerConfig, path: &str) -> PathBuf {
        let path = PathBuf::from(path.replace("{app_name}", &config.app_name));
        if path.is_absolute() {
            path
        } else {
            config.file.logs_dir.join(path)
        }
    }

    /// Remove one sink by name or id, or every sink when `handler` is `None`
    ///
    /// Returns the number of sinks removed.
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidHandlerType`] if `handler_type` is neither
    /// `NAME` nor `ID`; nothing is removed in that case.
    pub fn remove_handler(&self, handler: Option<&str>, handler_type: &str) -> Result<usize> {
        let Some(handler) = handler else {
            return Ok(self.registry.remove_all());
        };

        let removed = match handler_type.trim().to_uppercase().as_str() {
            "NAME" => self.registry.remove(HandlerRef::Name(handler.to_string())),
            "ID" => match handler.trim().parse::<usize>() {
                Ok(id) => self.registry.remove(SinkId::from(id)),
                Err(_) => false,
            },
            _ => return Err(LoggerError::invalid_handler_type(handler_type)),
        };
        Ok(usize::from(removed))
    }

    /// Remove one sink; `false` if it was not registered
    pub fn remove(&self, handler: impl Into<HandlerRef>) -> bool {
        self.registry.remove(handler)
    }

    /// Deep-merge `patch` over the current configuration
    ///
    /// Existing sinks keep the settings they were built with until the
    /// next [`load`](Self::load).
    pub fn update_config(&self, patch: &Value) -> Result<()> {
        let mut slot = self.config.write();
        let current = serde_json::to_value(&**slot)?;
        let updated = LoggerConfig::from_value(deep_merge(&current, patch))?;
        *slot = Arc::new(updated);
        Ok(())
    }

    /// Replace the configuration wholesale
    pub fn replace_config(&self, config: LoggerConfig) -> Result<()> {
        config.validate()?;
        *self.config.write() = Arc::new(config);
        Ok(())
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> Arc<LoggerConfig> {
        Arc::clone(&self.config.read())
    }

    pub fn handlers_map(&self) -> BTreeMap<String, SinkId> {
        self.registry.handlers_map()
    }

    pub fn registry(&self) -> &Arc<SinkRegistry> {
        &self.registry
    }

    /// Handle with the configured `extra` fields bound
    pub fn logger(&self) -> Logger {
        Logger::new(Arc::clone(&self.registry)).bind_extra(&self.config().extra)
    }

    pub fn interceptor(&self) -> &Arc<Interceptor> {
        &self.interceptor
    }
}

impl fmt::Debug for LoggerLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerLoader")
            .field("app_name", &self.config().app_name)
            .field("handlers", &self.registry.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{IoWriter, SharedBuffer};
    use serde_json::json;
    use tempfile::tempdir;

    fn loader_in(dir: &Path, patch: Value) -> LoggerLoader {
        LoggerLoader::builder()
            .load_config_file(false)
            .env(EnvOverrides::default())
            .config(json!({"file": {"logs_dir": dir}}))
            .config(patch)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_load_registers_stream_only() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({}));
        loader.load().unwrap();

        let names: Vec<String> = loader.handlers_map().into_keys().collect();
        assert_eq!(names, vec!["STREAM.STD"]);
    }

    #[test]
    fn test_file_and_json_handlers() {
        let dir = tempdir().unwrap();
        let loader = loader_in(
            dir.path(),
            json!({
                "app_name": "svc",
                "stream": {"std_handler": {"enabled": false}},
                "file": {"log_handlers": {"enabled": true}, "json_handlers": {"enabled": true}}
            }),
        );
        let logger = loader.load().unwrap();

        assert_eq!(
            loader.registry().names(),
            vec!["FILE", "FILE_ERR", "FILE.JSON", "FILE.JSON_ERR"]
        );

        logger.info("hello");
        logger.error("broken");
        loader.registry().flush().unwrap();

        let all = std::fs::read_to_string(dir.path().join("svc.std.all.log")).unwrap();
        let err = std::fs::read_to_string(dir.path().join("svc.std.err.log")).unwrap();
        assert_eq!(all.lines().count(), 2);
        assert_eq!(err.lines().count(), 1);
        assert!(err.contains("broken"));

        let json_err = std::fs::read_to_string(dir.path().join("svc.json.err.log")).unwrap();
        let line: Value = serde_json::from_str(json_err.lines().next().unwrap()).unwrap();
        assert_eq!(line["record"]["message"], "broken");
        assert_eq!(line["record"]["level"]["name"], "ERROR");
    }

    #[test]
    fn test_add_handler_requires_target_for_other_names() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({}));

        let err = loader.add_handler("audit", SinkOptions::new()).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(loader.handlers_map().is_empty());
    }

    #[test]
    fn test_add_handler_normalizes_and_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({}));
        let buffer = SharedBuffer::new();

        let id = loader
            .add_handler(
                " audit ",
                SinkOptions::new()
                    .writer(Box::new(IoWriter::new(buffer.clone())))
                    .format("{level}:{message}"),
            )
            .unwrap();
        assert_eq!(loader.handlers_map().get("AUDIT"), Some(&id));

        let err = loader
            .add_handler("AUDIT", SinkOptions::new().writer(Box::new(IoWriter::new(Vec::new()))))
            .unwrap_err();
        assert!(matches!(err, LoggerError::DuplicateName { .. }));

        loader.logger().warning("w");
        assert_eq!(buffer.lines(), vec!["WARNING:w"]);
    }

    #[test]
    fn test_rejects_non_utf8_encoding() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({}));
        let err = loader
            .add_handler("FILE.LATIN", SinkOptions::new().encoding("latin-1"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_remove_handler() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({}));
        loader.load().unwrap();
        let id = loader.handlers_map()["STREAM.STD"];

        let err = loader.remove_handler(Some("STREAM.STD"), "bogus").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidHandlerType { .. }));
        assert_eq!(loader.handlers_map().len(), 1);

        assert_eq!(loader.remove_handler(Some("nope"), "name").unwrap(), 0);
        assert_eq!(loader.remove_handler(Some("abc"), "ID").unwrap(), 0);
        assert_eq!(
            loader
                .remove_handler(Some(&id.get().to_string()), " id ")
                .unwrap(),
            1
        );
        assert!(loader.handlers_map().is_empty());

        loader.load().unwrap();
        assert_eq!(loader.remove_handler(None, "ignored").unwrap(), 1);
    }

    #[test]
    fn test_update_config_deep_merges() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({"app_name": "first"}));

        loader
            .update_config(&json!({"file": {"log_handlers": {"enabled": true}}}))
            .unwrap();
        let config = loader.config();
        assert_eq!(config.app_name, "first");
        assert!(config.file.log_handlers.enabled);
        assert_eq!(config.file.logs_dir, dir.path());

        assert!(loader
            .update_config(&json!({"file": {"backup_count": 0}}))
            .is_err());
        assert_eq!(loader.config().file.backup_count, 90);
    }

    #[test]
    fn test_env_applied_on_load() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("from-env");
        let loader = LoggerLoader::builder()
            .load_config_file(false)
            .env(EnvOverrides {
                debug: true,
                logs_dir: Some(logs.clone()),
                config_path: None,
            })
            .build()
            .unwrap();

        loader.load().unwrap();
        let config = loader.config();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.file.logs_dir, logs);
    }

    #[test]
    fn test_config_file_lookup() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("logger.yml"),
            "logger:\n  app_name: from-file\n",
        )
        .unwrap();

        let loader = LoggerLoader::builder()
            .configs_dir(dir.path())
            .env(EnvOverrides::default())
            .config(json!({"level": "ERROR"}))
            .build()
            .unwrap();
        assert_eq!(loader.config().app_name, "from-file");
        assert_eq!(loader.config().level, LogLevel::Error);

        let missing = LoggerLoader::builder()
            .configs_dir(dir.path().join("absent"))
            .env(EnvOverrides::default())
            .build()
            .unwrap();
        assert_eq!(missing.config().level, LogLevel::Info);

        let toml = LoggerLoader::builder()
            .configs_dir(dir.path())
            .config_filename("logger.toml")
            .env(EnvOverrides::default())
            .build();
        assert!(matches!(toml, Err(LoggerError::ConfigLoad { .. })));
    }

    #[test]
    fn test_resolve_path() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({"app_name": "api"}));
        let config = loader.config();

        assert_eq!(
            loader.resolve_path(&config, "http/{app_name}.log"),
            dir.path().join("http/api.log")
        );
        assert_eq!(
            loader.resolve_path(&config, "/tmp/{app_name}.log"),
            PathBuf::from("/tmp/api.log")
        );
    }

    #[test]
    fn test_logger_binds_config_extra() {
        let dir = tempdir().unwrap();
        let loader = loader_in(dir.path(), json!({"extra": {"region": "eu"}}));
        let buffer = SharedBuffer::new();
        loader
            .add_handler(
                "CAPTURE",
                SinkOptions::new()
                    .writer(Box::new(IoWriter::new(buffer.clone())))
                    .format("{extra[region]} {message}"),
            )
            .unwrap();

        loader.logger().info("x");
        assert_eq!(buffer.lines(), vec!["eu x"]);
    }
}
