//! Errors raised while configuring or running sinks

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Configuration file could not be read or parsed
    #[error("Failed to load config '{path}': {message}")]
    ConfigLoad { path: String, message: String },

    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    #[error("Handler '{name}' already exists in logger")]
    DuplicateName { name: String },

    #[error("Failed to create directory '{}': {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removal discriminator other than NAME or ID
    #[error("Handler type '{value}' is invalid, must be 'NAME' or 'ID'")]
    InvalidHandlerType { value: String },

    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Log file could not be opened or appended to
    #[error("Cannot write log file '{path}': {message}")]
    FileAppender { path: String, message: String },

    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Sink disabled after a failed rotation
    #[error("Sink for '{path}' is disabled after a failed rotation")]
    SinkPoisoned { path: String },

    #[error("Writer error: {0}")]
    Writer(String),

    /// A record could not be rendered by its sink's formatter
    #[error("Formatter '{kind}' failed: {message}")]
    Formatter { kind: String, message: String },

    /// The sink's worker has shut down
    #[error("Failed to send log record to sink worker '{sink}'")]
    ChannelSend { sink: String },

    /// Another `log` facade logger is already installed
    #[error("Failed to install log interceptor: {0}")]
    InterceptInstall(String),

    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn config_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ConfigLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// [`LoggerError::InvalidConfiguration`] for `component`
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        LoggerError::DuplicateName { name: name.into() }
    }

    pub fn directory_creation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoggerError::DirectoryCreation {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_handler_type(value: impl Into<String>) -> Self {
        LoggerError::InvalidHandlerType {
            value: value.into(),
        }
    }

    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppender {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn sink_poisoned(path: impl Into<String>) -> Self {
        LoggerError::SinkPoisoned { path: path.into() }
    }

    pub fn formatter(kind: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Formatter {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::Writer(msg.into())
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the error came from reading or validating configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            LoggerError::ConfigLoad { .. } | LoggerError::InvalidConfiguration { .. }
        )
    }
}
