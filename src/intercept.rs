//! Adapter for the `log` facade
//!
//! Libraries that log through the `log` crate are forwarded into the
//! registry once [`Interceptor::install`] has run. Which targets get
//! through is decided by [`InterceptRules`], rebuilt from the
//! configuration on every load:
//!
//! 1. muted modules are dropped before anything else;
//! 2. included modules are always forwarded;
//! 3. with auto-load on, everything else is forwarded unless ignored;
//! 4. otherwise the record is dropped.

use crate::config::InterceptConfig;
use crate::core::{
    error::{LoggerError, Result},
    extra::FieldValue,
    log_level::LogLevel,
    logger::Logger,
    record::Location,
    registry::DispatchReport,
};
use log::kv::{self, Key, VisitSource};
use parking_lot::RwLock;
use std::sync::Arc;

/// Routing rules for foreign records, keyed by target module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptRules {
    pub auto_load: bool,
    pub only_base: bool,
    pub ignore_modules: Vec<String>,
    pub include_modules: Vec<String>,
    pub mute_modules: Vec<String>,
}

impl InterceptRules {
    pub fn from_config(config: &InterceptConfig) -> Self {
        Self {
            auto_load: config.auto_load.enabled,
            only_base: config.auto_load.only_base,
            ignore_modules: config.auto_load.ignore_modules.clone(),
            include_modules: config.include_modules.clone(),
            mute_modules: config.mute_modules.clone(),
        }
    }

    /// Whether a record from `module` should be forwarded
    pub fn forwards(&self, module: &str) -> bool {
        if self.mute_modules.iter().any(|m| is_within(module, m)) {
            return false;
        }
        if self.include_modules.iter().any(|m| is_within(module, m)) {
            return true;
        }
        if !self.auto_load {
            return false;
        }

        let key = if self.only_base {
            base_module(module)
        } else {
            module
        };
        !self.ignore_modules.iter().any(|m| m == key)
    }

    /// Included modules that are not muted
    pub fn intercepted(&self) -> Vec<&str> {
        self.include_modules
            .iter()
            .filter(|m| !self.mute_modules.contains(m))
            .map(String::as_str)
            .collect()
    }

    /// One-line description used in the TRACE record emitted after load
    pub fn summary(&self) -> String {
        format!(
            "Intercepted modules: {:?}; Muted modules: {:?}; Auto load: {} (ignored: {:?});",
            self.intercepted(),
            self.mute_modules,
            self.auto_load,
            self.ignore_modules
        )
    }
}

/// `module` equals `prefix` or lies below it on a `::` or `.` boundary
fn is_within(module: &str, prefix: &str) -> bool {
    match module.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with("::") || rest.starts_with('.'),
        None => false,
    }
}

fn base_module(module: &str) -> &str {
    let end = module
        .find("::")
        .into_iter()
        .chain(module.find('.'))
        .min()
        .unwrap_or(module.len());
    &module[..end]
}

/// Forwards `log` records into a [`Logger`]
///
/// # Example
///
/// ```
/// use rust_log_loader::prelude::*;
/// use rust_log_loader::intercept::{InterceptRules, Interceptor};
/// use std::sync::Arc;
///
/// let logger = Logger::new(Arc::new(SinkRegistry::new()));
/// let interceptor = Arc::new(Interceptor::new(logger, InterceptRules::default()));
/// assert!(!interceptor.rules().auto_load);
/// ```
#[derive(Debug)]
pub struct Interceptor {
    logger: RwLock<Logger>,
    rules: RwLock<Arc<InterceptRules>>,
}

impl Interceptor {
    pub fn new(logger: Logger, rules: InterceptRules) -> Self {
        Self {
            logger: RwLock::new(logger),
            rules: RwLock::new(Arc::new(rules)),
        }
    }

    pub fn rules(&self) -> Arc<InterceptRules> {
        Arc::clone(&self.rules.read())
    }

    pub fn set_rules(&self, rules: InterceptRules) {
        *self.rules.write() = Arc::new(rules);
    }

    pub fn set_logger(&self, logger: Logger) {
        *self.logger.write() = logger;
    }

    /// Register as the process-wide `log` logger
    ///
    /// # Errors
    ///
    /// [`LoggerError::InterceptInstall`] if a `log` logger is already set,
    /// including by an earlier call to this method.
    pub fn install(self: &Arc<Self>) -> Result<()> {
        log::set_boxed_logger(Box::new(FacadeAdapter(Arc::clone(self))))
            .map_err(|e| LoggerError::InterceptInstall(e.to_string()))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Convert and dispatch one facade record
    ///
    /// Returns `None` when the routing rules drop the record.
    pub fn handle(&self, record: &log::Record<'_>) -> Option<DispatchReport> {
        if !self.rules().forwards(record.target()) {
            return None;
        }

        let module = record.module_path().unwrap_or_else(|| record.target());

        let location = Location::new(
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
            module,
        );

        let mut fields = FieldCollector::default();
        if let Err(e) = record.key_values().visit(&mut fields) {
            eprintln!("[LOGGER WARNING] Failed to read key-values of a log record: {}", e);
        }

        let logger = self.logger.read().clone();
        let mut converted = logger
            .record(LogLevel::from(record.level()), record.args().to_string())
            .with_location(location);
        for (key, value) in fields.0 {
            converted = converted.with_field(key, value);
        }

        Some(logger.emit(converted))
    }
}

struct FacadeAdapter(Arc<Interceptor>);

impl log::Log for FacadeAdapter {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.0.handle(record);
    }

    fn flush(&self) {
        if let Err(e) = self.0.logger.read().flush() {
            eprintln!("[LOGGER ERROR] Failed to flush intercepted records: {}", e);
        }
    }
}

#[derive(Default)]
struct FieldCollector(Vec<(String, FieldValue)>);

impl<'kvs> VisitSource<'kvs> for FieldCollector {
    fn visit_pair(&mut self, key: Key<'kvs>, value: kv::Value<'kvs>) -> std::result::Result<(), kv::Error> {
        let value = if let Some(b) = value.to_bool() {
            FieldValue::Bool(b)
        } else if let Some(i) = value.to_i64() {
            FieldValue::Int(i)
        } else if let Some(f) = value.to_f64() {
            FieldValue::Float(f)
        } else if let Some(s) = value.to_borrowed_str() {
            FieldValue::String(s.to_string())
        } else {
            FieldValue::String(value.to_string())
        };
        self.0.push((key.as_str().to_string(), value));
        Ok(())
    }
}
