//! Sink writers - where rendered log lines end up

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::UdpSocket;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::level::Severity;
use crate::application::errors::LoggingError;

/// Destination for rendered log lines. Write failures are swallowed;
/// logging must never take the process down.
pub trait SinkWriter: Send + Sync {
    fn write_line(&self, severity: Severity, line: &str);
}

/// Standard stream used by the console sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliTarget {
    Stdout,
    Stderr,
}

impl CliTarget {
    pub fn parse(name: &str) -> Result<Self, LoggingError> {
        match name.trim().to_lowercase().as_str() {
            "stdout" => Ok(CliTarget::Stdout),
            "stderr" => Ok(CliTarget::Stderr),
            _ => Err(LoggingError::InvalidTarget(name.to_string())),
        }
    }
}

/// Console writer
pub struct StreamWriter {
    target: CliTarget,
}

impl StreamWriter {
    pub fn new(target: CliTarget) -> Self {
        Self { target }
    }
}

impl SinkWriter for StreamWriter {
    fn write_line(&self, _severity: Severity, line: &str) {
        let _ = match self.target {
            CliTarget::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
            CliTarget::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
        };
    }
}

/// Appends to a log file
pub struct FileWriter {
    file: Mutex<File>,
}

impl FileWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoggingError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggingError::FileSink {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SinkWriter for FileWriter {
    fn write_line(&self, _severity: Severity, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

const SYSLOG_FACILITY_USER: u8 = 1;
const SYSLOG_UDP_ADDR: &str = "127.0.0.1:514";
#[cfg(unix)]
const SYSLOG_SOCKET_PATH: &str = "/dev/log";

enum SyslogSocket {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixDatagram),
    Udp(UdpSocket),
}

impl SyslogSocket {
    fn connect() -> Option<Self> {
        #[cfg(unix)]
        {
            if let Ok(sock) = std::os::unix::net::UnixDatagram::unbound() {
                if sock.connect(SYSLOG_SOCKET_PATH).is_ok() {
                    return Some(SyslogSocket::Unix(sock));
                }
            }
        }
        let sock = UdpSocket::bind("0.0.0.0:0").ok()?;
        sock.connect(SYSLOG_UDP_ADDR).ok()?;
        Some(SyslogSocket::Udp(sock))
    }

    fn send(&self, payload: &[u8]) -> std::io::Result<usize> {
        match self {
            #[cfg(unix)]
            SyslogSocket::Unix(sock) => sock.send(payload),
            SyslogSocket::Udp(sock) => sock.send(payload),
        }
    }
}

/// RFC 3164 datagram writer for the local system log
pub struct SyslogWriter {
    tag: String,
    socket: Mutex<Option<SyslogSocket>>,
}

impl SyslogWriter {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            socket: Mutex::new(None),
        }
    }

    fn frame(&self, severity: Severity, line: &str) -> String {
        let priority = SYSLOG_FACILITY_USER * 8 + severity.syslog_code();
        format!("<{}>{}[{}]: {}", priority, self.tag, std::process::id(), line)
    }
}

impl SinkWriter for SyslogWriter {
    fn write_line(&self, severity: Severity, line: &str) {
        let Ok(mut socket) = self.socket.lock() else {
            return;
        };
        if socket.is_none() {
            *socket = SyslogSocket::connect();
        }
        let payload = self.frame(severity, line);
        let failed = socket
            .as_ref()
            .map(|sock| sock.send(payload.as_bytes()).is_err())
            .unwrap_or(false);
        if failed {
            // reconnect on the next line, e.g. after syslogd restarted
            *socket = None;
        }
    }
}

/// Keeps lines in memory; handy for tests and embedding
#[derive(Clone, Default)]
pub struct MemoryWriter {
    lines: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, line)| line).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl SinkWriter for MemoryWriter {
    fn write_line(&self, severity: Severity, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((severity, line.to_string()));
        }
    }
}
