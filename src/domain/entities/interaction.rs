use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ChannelId, GuildId, UserId};
use crate::application::errors::CommandError;

/// A value supplied for a command parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgumentValue {
    String(String),
    User(UserId),
    Integer(i64),
    Boolean(bool),
}

/// Kind of context an interaction originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Voice,
    Stage,
    Forum,
    Thread,
    DirectMessage,
    Other,
}

/// Channel an interaction was invoked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub kind: ChannelKind,
}

impl Channel {
    pub fn text(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            kind: ChannelKind::Text,
        }
    }

    /// Only guild text channels accept channel-visible bot messages
    pub fn is_text_capable(&self) -> bool {
        self.kind == ChannelKind::Text
    }
}

fn new_interaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An inbound slash command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(default = "new_interaction_id")]
    pub id: String,
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default)]
    pub channel: Option<Channel>,
    pub command: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentValue>,
}

impl InteractionEvent {
    pub fn new(guild_id: impl Into<GuildId>, user_id: impl Into<UserId>, command: impl Into<String>) -> Self {
        Self {
            id: new_interaction_id(),
            guild_id: guild_id.into(),
            user_id: user_id.into(),
            channel: None,
            command: command.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    pub fn string_arg(&self, name: &str) -> Result<&str, CommandError> {
        match self.argument(name) {
            Some(ArgumentValue::String(s)) => Ok(s),
            Some(other) => Err(CommandError::InvalidArgs(format!(
                "{} must be a string, got {:?}",
                name, other
            ))),
            None => Err(CommandError::InvalidArgs(format!("missing argument {}", name))),
        }
    }

    pub fn user_arg(&self, name: &str) -> Result<UserId, CommandError> {
        match self.argument(name) {
            Some(ArgumentValue::User(id)) => Ok(*id),
            Some(other) => Err(CommandError::InvalidArgs(format!(
                "{} must be a user, got {:?}",
                name, other
            ))),
            None => Err(CommandError::InvalidArgs(format!("missing argument {}", name))),
        }
    }

    pub fn in_text_channel(&self) -> bool {
        self.channel.map(|c| c.is_text_capable()).unwrap_or(false)
    }
}

/// Outbound actions produced by a command handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Response only the invoking user can see
    pub ephemeral: Option<String>,
    /// Message posted to the originating channel
    pub channel: Option<String>,
}

impl Reply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            ephemeral: Some(text.into()),
            channel: None,
        }
    }

    pub fn with_channel_message(mut self, text: impl Into<String>) -> Self {
        self.channel = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ephemeral.is_none() && self.channel.is_none()
    }
}
