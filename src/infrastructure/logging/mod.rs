//! Logging - Configuration driven sinks behind `tracing`

pub mod format;
pub mod level;
pub mod router;
pub mod sinks;

pub use format::{LogRecord, LogTemplate};
pub use level::Severity;
pub use router::{LogRouter, LogSinkSpec, RouterLayer, SinkKind};
pub use sinks::{CliTarget, FileWriter, MemoryWriter, SinkWriter, StreamWriter, SyslogWriter};
