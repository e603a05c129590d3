//! Log line templates
//!
//! Templates use `%(field)s` placeholders with optional printf-style flags,
//! width and precision, e.g. `[%(levelname) 7s] %(message)s`. A `-` flag
//! left-aligns, `%%` is a literal percent sign.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt::Write;

use super::level::Severity;
use crate::application::errors::LoggingError;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(?:%|\(([A-Za-z_]+)\)([-#0 +]*)([0-9]*)(?:\.([0-9]+))?([sdr]))")
        .expect("placeholder pattern is valid")
});

/// One formatted log event
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: DateTime<Local>,
    pub severity: Severity,
    pub target: String,
    pub module: Option<String>,
    pub line: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    AscTime,
    LevelName,
    LevelNo,
    Name,
    Module,
    LineNo,
    Message,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "asctime" => Some(Field::AscTime),
            "levelname" => Some(Field::LevelName),
            "levelno" => Some(Field::LevelNo),
            "name" => Some(Field::Name),
            "module" => Some(Field::Module),
            "lineno" => Some(Field::LineNo),
            "message" => Some(Field::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field {
        field: Field,
        left: bool,
        width: usize,
        precision: Option<usize>,
    },
}

/// Parsed format template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTemplate {
    source: String,
    pieces: Vec<Piece>,
}

impl LogTemplate {
    pub fn parse(template: &str) -> Result<Self, LoggingError> {
        let invalid = |message: String| LoggingError::InvalidFormat {
            format: template.to_string(),
            message,
        };

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            literal.push_str(&template[last..whole.start()]);
            last = whole.end();

            let Some(name) = caps.get(1) else {
                literal.push('%');
                continue;
            };
            let field = Field::from_name(name.as_str())
                .ok_or_else(|| invalid(format!("unknown field '{}'", name.as_str())))?;
            let flags = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let width = match caps.get(3).map(|m| m.as_str()).unwrap_or("") {
                "" => 0,
                digits => digits.parse().map_err(|_| invalid(format!("bad width '{}'", digits)))?,
            };
            let precision = match caps.get(4) {
                Some(m) => Some(
                    m.as_str()
                        .parse()
                        .map_err(|_| invalid(format!("bad precision '{}'", m.as_str())))?,
                ),
                None => None,
            };

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Field {
                field,
                left: flags.contains('-'),
                width,
                precision,
            });
        }
        literal.push_str(&template[last..]);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            pieces,
        })
    }

    /// Template printing the bare message
    pub fn message_only() -> Self {
        Self {
            source: "%(message)s".to_string(),
            pieces: vec![Piece::Field {
                field: Field::Message,
                left: false,
                width: 0,
                precision: None,
            }],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, record: &LogRecord, date_format: &str) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field {
                    field,
                    left,
                    width,
                    precision,
                } => {
                    let mut value = field_value(*field, record, date_format);
                    if let Some(max) = precision {
                        if let Some((cut, _)) = value.char_indices().nth(*max) {
                            value.truncate(cut);
                        }
                    }
                    let _ = if *left {
                        write!(out, "{:<width$}", value, width = *width)
                    } else {
                        write!(out, "{:>width$}", value, width = *width)
                    };
                }
            }
        }
        out
    }
}

fn field_value(field: Field, record: &LogRecord, date_format: &str) -> String {
    match field {
        Field::AscTime => {
            let mut out = String::new();
            if write!(out, "{}", record.time.format(date_format)).is_err() {
                out = record.time.to_rfc3339();
            }
            out
        }
        Field::LevelName => record.severity.as_str().to_string(),
        Field::LevelNo => record.severity.number().to_string(),
        Field::Name => record.target.clone(),
        Field::Module => record.module.clone().unwrap_or_default(),
        Field::LineNo => record.line.map(|l| l.to_string()).unwrap_or_default(),
        Field::Message => record.message.clone(),
    }
}

/// Reject strftime strings chrono cannot render
pub fn validate_date_format(date_format: &str) -> Result<(), LoggingError> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(LoggingError::InvalidFormat {
            format: date_format.to_string(),
            message: "invalid date format".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        LogRecord {
            time: Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap(),
            severity: Severity::Info,
            target: "mcvouchy::config".to_string(),
            module: Some("mcvouchy::infrastructure::config".to_string()),
            line: Some(12),
            message: "hello".to_string(),
        }
    }

    #[test]
    fn test_default_cli_format() {
        let template =
            LogTemplate::parse("[%(asctime)s] [%(levelname) 7s] [%(name)  21s] %(message)s").unwrap();
        let line = template.render(&record(), "%Y-%m-%d %H:%M:%S");
        assert_eq!(
            line,
            "[2024-03-05 14:07:09] [   INFO] [     mcvouchy::config] hello"
        );
    }

    #[test]
    fn test_left_align_and_precision() {
        let template = LogTemplate::parse("%(levelname)-8s|%(message).3s|%(levelno)d").unwrap();
        assert_eq!(template.render(&record(), "%Y"), "INFO    |hel|20");
    }

    #[test]
    fn test_percent_escape() {
        let template = LogTemplate::parse("100%% %(message)s").unwrap();
        assert_eq!(template.render(&record(), "%Y"), "100% hello");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = LogTemplate::parse("%(process)s %(message)s").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFormat { .. }));
    }

    #[test]
    fn test_date_format_validation() {
        assert!(validate_date_format("%Y-%m-%d %H:%M:%S %z").is_ok());
        assert!(validate_date_format("%Q").is_err());
    }
}
