//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Key not found: [{section}] {key}")]
    KeyNotFound { section: String, key: String },

    #[error("Invalid value for [{section}] {key}: {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

impl ConfigError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn key_not_found(section: &str, key: &str) -> Self {
        Self::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid_value(section: &str, key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Logging configuration errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),

    #[error("{sink} sink: {source}")]
    Sink {
        sink: &'static str,
        #[source]
        source: Box<LoggingError>,
    },

    #[error("Cannot open log file {path}: {source}")]
    FileSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log format '{format}': {message}")]
    InvalidFormat { format: String, message: String },

    #[error("Unknown console target: {0}")]
    InvalidTarget(String),

    #[error("Cannot install log router: {0}")]
    Install(String),

    #[error("Missing logging setting: {0}")]
    Setting(#[from] ConfigError),

    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<LoggingError>),
}

/// Command declaration and execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Duplicate command: {0}")]
    Duplicate(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Errors reported by a gateway collaborator
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    #[error("Connection closed")]
    Closed,
}

/// Command synchronization errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync failed for guild {guild_id}: {cause}")]
    SyncFailed {
        guild_id: u64,
        #[source]
        cause: GatewayError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_logging_errors_are_joined() {
        let err = LoggingError::Multiple(vec![
            LoggingError::InvalidLogLevel("loud".to_string()),
            LoggingError::InvalidLogLevel("quiet".to_string()),
        ]);
        assert_eq!(err.to_string(), "Unknown log level: loud; Unknown log level: quiet");
    }

    #[test]
    fn test_config_error_converts_into_bot_error() {
        let err: BotError = ConfigError::key_not_found("mcvouchy", "secret_token").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Key not found: [mcvouchy] secret_token"
        );
    }
}
