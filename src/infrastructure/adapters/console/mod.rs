//! Console adapter for development/testing
//!
//! Gateway events are read as JSON lines, one [`GatewayEvent`] per line:
//!
//! ```text
//! {"type":"ready","guild_ids":[1]}
//! {"type":"interaction","guild_id":1,"user_id":2,"channel":{"id":3,"kind":"text"},"command":"limits"}
//! ```
//!
//! Outbound calls, starting with an `identify` carrying the bot token, are
//! written to stdout as JSON lines. A failed write is reported to the caller.

use async_trait::async_trait;
use serde_json::json;
use std::io::{ErrorKind, Write};
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::GatewayError;
use crate::domain::entities::{ChannelId, GatewayEvent, GuildCommandSet, InteractionEvent};
use crate::domain::traits::Gateway;
use crate::infrastructure::config::SecretToken;

const EVENT_BUFFER: usize = 64;

/// Console gateway adapter for local development
pub struct ConsoleGateway {
    token: SecretToken,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleGateway {
    /// Gateway writing to stdout
    pub fn new(token: SecretToken) -> Self {
        Self::with_writer(token, Box::new(std::io::stdout()))
    }

    pub fn with_writer(token: SecretToken, out: Box<dyn Write + Send>) -> Self {
        Self {
            token,
            out: Mutex::new(out),
        }
    }

    /// Identify with the bot token, then stream events from stdin until end
    /// of input
    pub fn connect(&self) -> Result<mpsc::Receiver<GatewayEvent>, GatewayError> {
        self.identify()?;
        Ok(read_events(BufReader::new(tokio::io::stdin())))
    }

    fn identify(&self) -> Result<(), GatewayError> {
        self.emit(json!({
            "op": "identify",
            "token": self.token.expose(),
        }))
    }

    fn emit(&self, value: serde_json::Value) -> Result<(), GatewayError> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{}", value)
            .and_then(|_| out.flush())
            .map_err(|e| match e.kind() {
                ErrorKind::BrokenPipe => GatewayError::Closed,
                _ => GatewayError::Transport(e.to_string()),
            })
    }
}

/// Spawn a task turning JSON lines into gateway events. Lines that fail to
/// parse are logged and skipped.
pub fn read_events<R>(reader: R) -> mpsc::Receiver<GatewayEvent>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read gateway input: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GatewayEvent>(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("Ignoring malformed gateway event: {}", e),
            }
        }
        tracing::debug!("Console gateway input closed");
    });
    rx
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn push_commands(&self, commands: &GuildCommandSet) -> Result<(), GatewayError> {
        self.emit(json!({
            "op": "push_commands",
            "guild_id": commands.guild_id,
            "commands": commands.commands,
        }))
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), GatewayError> {
        self.emit(json!({
            "op": "send_message",
            "channel_id": channel_id,
            "content": content,
        }))
    }

    async fn respond(
        &self,
        interaction: &InteractionEvent,
        content: &str,
        ephemeral: bool,
    ) -> Result<(), GatewayError> {
        self.emit(json!({
            "op": "respond",
            "interaction_id": interaction.id,
            "content": content,
            "ephemeral": ephemeral,
        }))
    }
}
