use serde::{Deserialize, Serialize};

use super::{GuildId, InteractionEvent};

/// Events delivered by the gateway connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The connection is ready; commands must be (re)registered for these guilds
    Ready { guild_ids: Vec<GuildId> },
    /// A user invoked a slash command
    Interaction(InteractionEvent),
}
