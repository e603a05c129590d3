//! Log router - Console, syslog and file sinks driven by configuration

use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use super::format::{validate_date_format, LogRecord, LogTemplate};
use super::level::Severity;
use super::sinks::{CliTarget, FileWriter, SinkWriter, StreamWriter, SyslogWriter};
use crate::application::errors::LoggingError;
use crate::infrastructure::config::{ConfigSnapshot, APP_NAME};

const SECTION: &str = "logging";
const SYSLOG_FORMAT: &str = "%(name)s: %(message)s";
const INITIAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// The fixed set of sinks a router owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    Syslog,
    File,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Console => "console",
            SinkKind::Syslog => "syslog",
            SinkKind::File => "file",
        }
    }
}

/// Effective configuration of one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSinkSpec {
    pub kind: SinkKind,
    pub level: Severity,
    pub format: String,
    pub date_format: String,
}

#[derive(Clone)]
struct Sink {
    level: Severity,
    template: LogTemplate,
    writer: Arc<dyn SinkWriter>,
}

#[derive(Clone)]
struct RouterState {
    date_format: String,
    console_target: CliTarget,
    console: Sink,
    syslog: Sink,
    file: Option<(PathBuf, Sink)>,
}

impl RouterState {
    fn sink(&self, kind: SinkKind) -> Option<&Sink> {
        match kind {
            SinkKind::Console => Some(&self.console),
            SinkKind::Syslog => Some(&self.syslog),
            SinkKind::File => self.file.as_ref().map(|(_, sink)| sink),
        }
    }
}

struct RouterInner {
    state: RwLock<RouterState>,
    reconfiguring: Mutex<()>,
    console_override: Option<Arc<dyn SinkWriter>>,
}

impl RouterInner {
    fn read_state(&self) -> RwLockReadGuard<'_, RouterState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, record: &LogRecord) {
        let state = self.read_state();
        let sinks = [
            Some(&state.console),
            Some(&state.syslog),
            state.file.as_ref().map(|(_, sink)| sink),
        ];
        for sink in sinks.into_iter().flatten() {
            if record.severity >= sink.level {
                let line = sink.template.render(record, &state.date_format);
                sink.writer.write_line(record.severity, &line);
            }
        }
    }
}

/// Owns the console, syslog and optional file sinks.
///
/// Cheap to clone; clones share the same sinks. Every sink enforces its own
/// floor, the router itself lets everything from DEBUG up through.
#[derive(Clone)]
pub struct LogRouter {
    inner: Arc<RouterInner>,
}

impl LogRouter {
    /// Router writing to the standard streams and the local syslog
    pub fn new() -> Self {
        Self::build(None, Arc::new(SyslogWriter::new(APP_NAME)))
    }

    /// Router with caller supplied console and syslog writers
    pub fn with_writers(console: Arc<dyn SinkWriter>, syslog: Arc<dyn SinkWriter>) -> Self {
        Self::build(Some(console), syslog)
    }

    fn build(console_override: Option<Arc<dyn SinkWriter>>, syslog: Arc<dyn SinkWriter>) -> Self {
        let console_target = CliTarget::Stderr;
        let console_writer = console_override
            .clone()
            .unwrap_or_else(|| Arc::new(StreamWriter::new(console_target)));
        let state = RouterState {
            date_format: INITIAL_DATE_FORMAT.to_string(),
            console_target,
            console: Sink {
                level: Severity::Warning,
                template: LogTemplate::message_only(),
                writer: console_writer,
            },
            syslog: Sink {
                level: Severity::Warning,
                template: LogTemplate::message_only(),
                writer: syslog,
            },
            file: None,
        };
        Self {
            inner: Arc::new(RouterInner {
                state: RwLock::new(state),
                reconfiguring: Mutex::new(()),
                console_override,
            }),
        }
    }

    /// Apply the `[logging]` section of a snapshot to every sink.
    ///
    /// Sinks are reconfigured independently: a bad setting for one sink is
    /// reported and leaves that sink's previous value in place while the
    /// others still update. The new state becomes visible to loggers in one
    /// step before this returns.
    pub fn reconfigure(&self, snapshot: &ConfigSnapshot) -> Result<(), LoggingError> {
        let _guard = self.inner.reconfiguring.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.inner.read_state().clone();
        let mut next = current.clone();
        let mut errors = Vec::new();

        match setting(snapshot, "date_format").and_then(|f| validate_date_format(f).map(|_| f)) {
            Ok(date_format) => next.date_format = date_format.to_string(),
            Err(e) => errors.push(e),
        }

        // console
        match setting(snapshot, "cli_level").and_then(Severity::parse) {
            Ok(level) => next.console.level = level,
            Err(e) => errors.push(sink_error(SinkKind::Console, e)),
        }
        match setting(snapshot, "cli_format").and_then(LogTemplate::parse) {
            Ok(template) => next.console.template = template,
            Err(e) => errors.push(sink_error(SinkKind::Console, e)),
        }
        if let Some(target) = snapshot.get_opt(SECTION, "cli_target") {
            match CliTarget::parse(target) {
                Ok(target) if target != current.console_target => {
                    next.console_target = target;
                    if self.inner.console_override.is_none() {
                        next.console.writer = Arc::new(StreamWriter::new(target));
                    }
                }
                Ok(_) => {}
                Err(e) => errors.push(sink_error(SinkKind::Console, e)),
            }
        }

        // syslog
        match setting(snapshot, "syslog_level").and_then(Severity::parse) {
            Ok(level) => next.syslog.level = level,
            Err(e) => errors.push(sink_error(SinkKind::Syslog, e)),
        }
        match LogTemplate::parse(SYSLOG_FORMAT) {
            Ok(template) => next.syslog.template = template,
            Err(e) => errors.push(sink_error(SinkKind::Syslog, e)),
        }

        // file, opt-in through file_target
        let target = snapshot
            .get_opt(SECTION, "file_target")
            .map(str::trim)
            .filter(|t| !t.is_empty());
        match target {
            None => next.file = None,
            Some(target) => {
                let path = PathBuf::from(target);
                let level = setting(snapshot, "file_level").and_then(Severity::parse);
                let existing = current
                    .file
                    .as_ref()
                    .filter(|(p, _)| *p == path)
                    .map(|(_, sink)| sink.clone());

                match existing {
                    Some(mut sink) => {
                        match level {
                            Ok(level) => sink.level = level,
                            Err(e) => errors.push(sink_error(SinkKind::File, e)),
                        }
                        sink.template = next.console.template.clone();
                        next.file = Some((path, sink));
                    }
                    None => {
                        let opened = level.and_then(|level| {
                            let writer = FileWriter::open(&path)?;
                            Ok(Sink {
                                level,
                                template: next.console.template.clone(),
                                writer: Arc::new(writer),
                            })
                        });
                        match opened {
                            Ok(sink) => next.file = Some((path, sink)),
                            Err(e) => errors.push(sink_error(SinkKind::File, e)),
                        }
                    }
                }
            }
        }

        *self.inner.state.write().unwrap_or_else(|e| e.into_inner()) = next;

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LoggingError::Multiple(errors)),
        }
    }

    /// Current configuration of a sink; `None` for a disabled file sink
    pub fn spec(&self, kind: SinkKind) -> Option<LogSinkSpec> {
        let state = self.inner.read_state();
        state.sink(kind).map(|sink| LogSinkSpec {
            kind,
            level: sink.level,
            format: sink.template.as_str().to_string(),
            date_format: state.date_format.clone(),
        })
    }

    /// Whether an event of `severity` would be written by the sink
    pub fn accepts(&self, kind: SinkKind, severity: Severity) -> bool {
        self.inner
            .read_state()
            .sink(kind)
            .map(|sink| severity >= sink.level)
            .unwrap_or(false)
    }

    pub fn file_target(&self) -> Option<PathBuf> {
        self.inner.read_state().file.as_ref().map(|(p, _)| p.clone())
    }

    pub fn is_file_target(&self, path: &Path) -> bool {
        self.file_target().as_deref() == Some(path)
    }

    /// `tracing` layer feeding events into this router
    pub fn layer(&self) -> RouterLayer {
        RouterLayer {
            inner: self.inner.clone(),
        }
    }

    /// Install the router as the process-wide subscriber
    pub fn install(&self) -> Result<(), LoggingError> {
        tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(self.layer())
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string()))
    }
}

impl Default for LogRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn setting<'a>(snapshot: &'a ConfigSnapshot, key: &str) -> Result<&'a str, LoggingError> {
    snapshot.get(SECTION, key).map_err(LoggingError::from)
}

fn sink_error(kind: SinkKind, source: LoggingError) -> LoggingError {
    LoggingError::Sink {
        sink: kind.as_str(),
        source: Box::new(source),
    }
}

/// Layer forwarding tracing events to the router's sinks
pub struct RouterLayer {
    inner: Arc<RouterInner>,
}

impl<S> Layer<S> for RouterLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let Some(severity) = Severity::from_tracing(*meta.level(), visitor.critical) else {
            return;
        };
        let record = LogRecord {
            time: Local::now(),
            severity,
            target: meta.target().to_string(),
            module: meta.module_path().map(str::to_string),
            line: meta.line(),
            message: visitor.finish(),
        };
        self.inner.emit(&record);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<String>,
    critical: bool,
}

impl EventVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.join(" ")
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for EventVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "critical" {
            self.critical = value;
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
