//! Environment overrides
//!
//! | Variable                 | Effect                                       |
//! |--------------------------|----------------------------------------------|
//! | `LOG_LOADER_CONFIG_PATH` | configuration file to load                   |
//! | `LOG_LOADER_LOGS_DIR`    | replaces `file.logs_dir`                     |
//! | `DEBUG`                  | `true`/`1` raises the level to DEBUG         |
//! | `ENV`                    | `development` acts like `DEBUG` when unset   |

use crate::config::LoggerConfig;
use crate::core::log_level::LogLevel;
use std::path::PathBuf;

pub const CONFIG_PATH_ENV_VAR: &str = "LOG_LOADER_CONFIG_PATH";
pub const LOGS_DIR_ENV_VAR: &str = "LOG_LOADER_LOGS_DIR";
pub const DEBUG_ENV_VAR: &str = "DEBUG";
pub const ENV_ENV_VAR: &str = "ENV";

/// Settings read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub config_path: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub debug: bool,
}

impl EnvOverrides {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through any lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let debug_flag = non_empty(DEBUG_ENV_VAR).map(|v| v.to_lowercase());
        let development = non_empty(ENV_ENV_VAR)
            .map(|v| v.to_lowercase() == "development")
            .unwrap_or(false);

        let debug = match debug_flag.as_deref() {
            Some("true") | Some("1") => true,
            Some(_) => false,
            None => development,
        };

        Self {
            config_path: non_empty(CONFIG_PATH_ENV_VAR).map(PathBuf::from),
            logs_dir: non_empty(LOGS_DIR_ENV_VAR).map(PathBuf::from),
            debug,
        }
    }

    /// Effective configuration after the overrides and the level rules
    ///
    /// DEBUG mode raises the level to DEBUG unless it is TRACE; TRACE
    /// always turns on diagnose; `use_icon` swaps the short level name in
    /// the stream template for the level icon.
    #[must_use]
    pub fn apply(&self, mut config: LoggerConfig) -> LoggerConfig {
        if let Some(ref logs_dir) = self.logs_dir {
            config.file.logs_dir = logs_dir.clone();
        }

        if self.debug && config.level != LogLevel::Trace {
            config.level = LogLevel::Debug;
        }

        if config.level == LogLevel::Trace {
            config.use_diagnose = true;
        }

        if config.stream.use_icon {
            config.stream.format_str = config
                .stream
                .format_str
                .replace("level_short:<5", "level.icon:<4");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(vars: &[(&str, &str)]) -> EnvOverrides {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_debug_flag() {
        assert!(overrides(&[("DEBUG", "true")]).debug);
        assert!(overrides(&[("DEBUG", " 1 ")]).debug);
        assert!(overrides(&[("DEBUG", "TRUE")]).debug);
        assert!(!overrides(&[("DEBUG", "false")]).debug);
        assert!(!overrides(&[]).debug);
    }

    #[test]
    fn test_development_env_only_when_debug_unset() {
        assert!(overrides(&[("ENV", "development")]).debug);
        assert!(overrides(&[("ENV", "Development"), ("DEBUG", "")]).debug);
        assert!(!overrides(&[("ENV", "development"), ("DEBUG", "0")]).debug);
        assert!(!overrides(&[("ENV", "production")]).debug);
    }

    #[test]
    fn test_paths() {
        let env = overrides(&[
            ("LOG_LOADER_CONFIG_PATH", "/etc/app/logger.yml"),
            ("LOG_LOADER_LOGS_DIR", "/var/log/app"),
        ]);
        assert_eq!(env.config_path, Some(PathBuf::from("/etc/app/logger.yml")));

        let config = env.apply(LoggerConfig::default());
        assert_eq!(config.file.logs_dir, PathBuf::from("/var/log/app"));
    }

    #[test]
    fn test_debug_raises_info_but_not_trace() {
        let env = overrides(&[("DEBUG", "1")]);

        let config = env.apply(LoggerConfig::default());
        assert_eq!(config.level, LogLevel::Debug);

        let config = env.apply(LoggerConfig {
            level: LogLevel::Trace,
            ..LoggerConfig::default()
        });
        assert_eq!(config.level, LogLevel::Trace);
        assert!(config.use_diagnose);
    }

    #[test]
    fn test_use_icon_swaps_level_field() {
        let mut config = LoggerConfig::default();
        config.stream.use_icon = true;

        let config = EnvOverrides::default().apply(config);
        assert!(config.stream.format_str.contains("{level.icon:<4}"));
        assert!(!config.stream.format_str.contains("level_short"));
    }
}
