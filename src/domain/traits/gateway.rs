use async_trait::async_trait;

use crate::application::errors::GatewayError;
use crate::domain::entities::{ChannelId, GuildCommandSet, InteractionEvent};

/// Gateway trait - outbound half of the chat platform connection
///
/// Inbound events arrive separately as a stream of
/// [`GatewayEvent`](crate::domain::entities::GatewayEvent)s. Implementations
/// perform no retries; a failed call is reported as-is.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Replace the guild's remote command list with exactly `commands`
    async fn push_commands(&self, commands: &GuildCommandSet) -> Result<(), GatewayError>;

    /// Post a message visible to everyone in a channel
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), GatewayError>;

    /// Answer one interaction, optionally only visible to the invoker
    async fn respond(
        &self,
        interaction: &InteractionEvent,
        content: &str,
        ephemeral: bool,
    ) -> Result<(), GatewayError>;
}
