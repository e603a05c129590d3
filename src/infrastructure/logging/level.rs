//! Severity levels shared by every sink

use std::fmt;
use std::str::FromStr;

use crate::application::errors::LoggingError;

/// Fixed severity enumeration, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Case-insensitive lookup; `warn` and `fatal` are accepted aliases
    pub fn parse(name: &str) -> Result<Self, LoggingError> {
        match name.trim().to_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            _ => Err(LoggingError::InvalidLogLevel(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Severity::Debug => 10,
            Severity::Info => 20,
            Severity::Warning => 30,
            Severity::Error => 40,
            Severity::Critical => 50,
        }
    }

    /// RFC 5424 severity code used by the syslog sink
    pub fn syslog_code(&self) -> u8 {
        match self {
            Severity::Debug => 7,
            Severity::Info => 6,
            Severity::Warning => 4,
            Severity::Error => 3,
            Severity::Critical => 2,
        }
    }

    /// Map a tracing level; TRACE sits below the root floor and maps to nothing.
    /// `critical` marks an ERROR event as critical.
    pub fn from_tracing(level: tracing::Level, critical: bool) -> Option<Self> {
        match level {
            tracing::Level::TRACE => None,
            tracing::Level::DEBUG => Some(Severity::Debug),
            tracing::Level::INFO => Some(Severity::Info),
            tracing::Level::WARN => Some(Severity::Warning),
            tracing::Level::ERROR if critical => Some(Severity::Critical),
            tracing::Level::ERROR => Some(Severity::Error),
        }
    }
}

impl FromStr for Severity {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::parse(s)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
