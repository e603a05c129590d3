//! In-memory gateway that records every outbound call

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::GatewayError;
use crate::domain::entities::{ChannelId, Command, GuildCommandSet, GuildId, InteractionEvent};
use crate::domain::traits::Gateway;

/// A channel message that was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub content: String,
}

/// An interaction response that was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentResponse {
    pub interaction_id: String,
    pub content: String,
    pub ephemeral: bool,
}

#[derive(Default)]
struct MemoryState {
    remote: HashMap<GuildId, Vec<Command>>,
    pushes: usize,
    messages: Vec<SentMessage>,
    responses: Vec<SentResponse>,
    failing_pushes: usize,
    fail_messages: bool,
    fail_responses: bool,
}

/// Gateway keeping the "remote" command lists in memory.
///
/// Pushes replace a guild's list wholesale, like the real platform's bulk
/// overwrite. Failures can be injected per operation.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Commands currently published for a guild
    pub fn remote_commands(&self, guild_id: GuildId) -> Option<Vec<Command>> {
        self.state().remote.get(&guild_id).cloned()
    }

    /// Number of successful pushes
    pub fn push_count(&self) -> usize {
        self.state().pushes
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.state().messages.clone()
    }

    pub fn responses(&self) -> Vec<SentResponse> {
        self.state().responses.clone()
    }

    /// Make the next `count` pushes fail without touching remote state
    pub fn fail_next_pushes(&self, count: usize) {
        self.state().failing_pushes = count;
    }

    pub fn fail_channel_messages(&self, fail: bool) {
        self.state().fail_messages = fail;
    }

    pub fn fail_responses(&self, fail: bool) {
        self.state().fail_responses = fail;
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn push_commands(&self, commands: &GuildCommandSet) -> Result<(), GatewayError> {
        let mut state = self.state();
        if state.failing_pushes > 0 {
            state.failing_pushes -= 1;
            return Err(GatewayError::Transport("injected push failure".to_string()));
        }
        state.remote.insert(commands.guild_id, commands.commands.clone());
        state.pushes += 1;
        Ok(())
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        if state.fail_messages {
            return Err(GatewayError::Rejected("injected message failure".to_string()));
        }
        state.messages.push(SentMessage {
            channel_id,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn respond(
        &self,
        interaction: &InteractionEvent,
        content: &str,
        ephemeral: bool,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        if state.fail_responses {
            return Err(GatewayError::Rejected("injected response failure".to_string()));
        }
        state.responses.push(SentResponse {
            interaction_id: interaction.id.clone(),
            content: content.to_string(),
            ephemeral,
        });
        Ok(())
    }
}
