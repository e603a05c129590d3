use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::application::errors::{BotError, CommandError, SyncError};
use crate::domain::entities::{Command, CommandParameter, GuildCommandSet, GuildId};
use crate::domain::traits::Gateway;

/// Builds the command set of one guild and publishes it
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    pending: GuildCommandSet,
}

impl CommandRegistry {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            pending: GuildCommandSet::new(guild_id),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.pending.guild_id
    }

    /// Add a command to the pending set; names are unique per guild
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<CommandParameter>,
    ) -> Result<&mut Self, CommandError> {
        let name = name.into();
        if self.pending.contains(&name) {
            return Err(CommandError::Duplicate(name));
        }
        self.pending
            .commands
            .push(Command::new(name, description, parameters));
        Ok(self)
    }

    pub fn pending(&self) -> &GuildCommandSet {
        &self.pending
    }

    /// Replace the guild's remote command list with the pending set.
    ///
    /// On failure the previously published list is presumed to still be in
    /// place remotely.
    pub async fn sync(&self, gateway: &dyn Gateway) -> Result<GuildCommandSet, SyncError> {
        gateway
            .push_commands(&self.pending)
            .await
            .map_err(|cause| SyncError::SyncFailed {
                guild_id: self.guild_id().get(),
                cause,
            })?;
        Ok(self.pending.clone())
    }
}

/// Published command sets and per-guild registration locks
#[derive(Default)]
pub struct GuildDirectory {
    published: RwLock<HashMap<GuildId, Arc<GuildCommandSet>>>,
    locks: Mutex<HashMap<GuildId, Arc<tokio::sync::Mutex<()>>>>,
}

impl GuildDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set last synced successfully for a guild
    pub fn published(&self, guild_id: GuildId) -> Option<Arc<GuildCommandSet>> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&guild_id)
            .cloned()
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        let mut guilds: Vec<GuildId> = self
            .published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        guilds.sort();
        guilds
    }

    fn guild_lock(&self, guild_id: GuildId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(guild_id)
            .or_default()
            .clone()
    }

    /// Declare and sync a fresh command set for one guild.
    ///
    /// Registrations for the same guild are serialized; different guilds
    /// proceed independently. The new set becomes the one interactions are
    /// matched against only once the sync succeeded.
    pub async fn register<F>(
        &self,
        guild_id: GuildId,
        gateway: &dyn Gateway,
        declare: F,
    ) -> Result<Arc<GuildCommandSet>, BotError>
    where
        F: FnOnce(&mut CommandRegistry) -> Result<(), CommandError>,
    {
        let lock = self.guild_lock(guild_id);
        let _guard = lock.lock().await;

        let mut registry = CommandRegistry::new(guild_id);
        declare(&mut registry)?;
        let synced = Arc::new(registry.sync(gateway).await?);

        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(guild_id, synced.clone());
        Ok(synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::GatewayError;
    use crate::domain::entities::{ChannelId, InteractionEvent};
    use crate::infrastructure::adapters::MemoryGateway;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Gateway whose pushes take a while and record how many overlapped
    #[derive(Default)]
    struct SlowGateway {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl Gateway for SlowGateway {
        async fn push_commands(&self, _commands: &GuildCommandSet) -> Result<(), GatewayError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_message(&self, _channel_id: ChannelId, _content: &str) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn respond(
            &self,
            _interaction: &InteractionEvent,
            _content: &str,
            _ephemeral: bool,
        ) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn declare_two(registry: &mut CommandRegistry) -> Result<(), CommandError> {
        registry
            .declare("one", "First", Vec::new())?
            .declare("two", "Second", vec![CommandParameter::string("text")])?;
        Ok(())
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut registry = CommandRegistry::new(GuildId(1));
        registry.declare("invite", "Invite", Vec::new()).unwrap();
        let err = registry.declare("invite", "Again", Vec::new()).unwrap_err();

        assert!(matches!(err, CommandError::Duplicate(name) if name == "invite"));
        assert_eq!(registry.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_pushes_pending_set() {
        let gateway = MemoryGateway::new();
        let mut registry = CommandRegistry::new(GuildId(9));
        declare_two(&mut registry).unwrap();

        let synced = registry.sync(&gateway).await.unwrap();
        assert_eq!(synced.len(), 2);
        assert_eq!(gateway.remote_commands(GuildId(9)).unwrap(), synced.commands);
    }

    #[tokio::test]
    async fn test_sync_failure() {
        let gateway = MemoryGateway::new();
        gateway.fail_next_pushes(1);
        let mut registry = CommandRegistry::new(GuildId(9));
        declare_two(&mut registry).unwrap();

        let err = registry.sync(&gateway).await.unwrap_err();
        assert!(matches!(err, SyncError::SyncFailed { guild_id: 9, .. }));
        assert!(gateway.remote_commands(GuildId(9)).is_none());
    }

    #[tokio::test]
    async fn test_failed_sync_keeps_published_set() {
        let gateway = MemoryGateway::new();
        let directory = GuildDirectory::new();
        let first = directory.register(GuildId(3), &gateway, declare_two).await.unwrap();

        gateway.fail_next_pushes(1);
        let result = directory
            .register(GuildId(3), &gateway, |registry| {
                registry.declare("three", "Third", Vec::new())?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(BotError::Sync(_))));
        assert_eq!(directory.published(GuildId(3)).unwrap(), first);
    }

    #[tokio::test]
    async fn test_duplicate_aborts_before_push() {
        let gateway = MemoryGateway::new();
        let directory = GuildDirectory::new();
        let result = directory
            .register(GuildId(4), &gateway, |registry| {
                registry.declare("x", "X", Vec::new())?.declare("x", "X", Vec::new())?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(BotError::Command(CommandError::Duplicate(_)))));
        assert_eq!(gateway.push_count(), 0);
        assert!(directory.published(GuildId(4)).is_none());
    }

    #[tokio::test]
    async fn test_same_guild_registrations_are_serialized() {
        let gateway = SlowGateway::default();
        let directory = GuildDirectory::new();

        let (a, b) = tokio::join!(
            directory.register(GuildId(6), &gateway, declare_two),
            directory.register(GuildId(6), &gateway, declare_two),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_guilds_register_in_parallel() {
        let gateway = SlowGateway::default();
        let directory = GuildDirectory::new();

        let (a, b) = tokio::join!(
            directory.register(GuildId(6), &gateway, declare_two),
            directory.register(GuildId(7), &gateway, declare_two),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(directory.guilds(), vec![GuildId(6), GuildId(7)]);
    }
}
