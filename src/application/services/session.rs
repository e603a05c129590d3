//! Bot session - Reacts to gateway events for the lifetime of a connection

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::application::context::AppContext;
use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::commands::{declare_commands, install_handlers};
use crate::application::messaging::{CommandDispatcher, DispatchOutcome};
use crate::domain::entities::{GatewayEvent, GuildId, InteractionEvent};
use crate::domain::traits::Gateway;

use super::{CommandRegistry, GuildDirectory};

/// Ties the gateway, the published command sets and the dispatcher together
#[derive(Clone)]
pub struct BotSession {
    gateway: Arc<dyn Gateway>,
    directory: Arc<GuildDirectory>,
    dispatcher: Arc<CommandDispatcher>,
}

impl BotSession {
    /// Fails when the command declarations are inconsistent, so a bad
    /// declaration surfaces at startup rather than on the first ready event
    pub fn new(context: &AppContext, gateway: Arc<dyn Gateway>) -> Result<Self, CommandError> {
        declare_commands(&mut CommandRegistry::new(GuildId(0)))?;

        let directory = Arc::new(GuildDirectory::new());
        let mut dispatcher = CommandDispatcher::new(gateway.clone(), directory.clone(), context.config().clone());
        install_handlers(&mut dispatcher);

        Ok(Self {
            gateway,
            directory,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn directory(&self) -> &Arc<GuildDirectory> {
        &self.directory
    }

    /// Register the command set in every guild, concurrently.
    ///
    /// A guild whose sync fails is logged and skipped; it keeps whatever set
    /// it had before.
    pub async fn on_ready(&self, guild_ids: Vec<GuildId>) {
        tracing::info!("Gateway ready, registering commands in {} guild(s)", guild_ids.len());

        let mut tasks = JoinSet::new();
        for guild_id in guild_ids {
            let directory = self.directory.clone();
            let gateway = self.gateway.clone();
            tasks.spawn(async move {
                let result = directory
                    .register(guild_id, gateway.as_ref(), declare_commands)
                    .await;
                (guild_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((guild_id, Ok(synced))) => {
                    tracing::info!("Registered {} command(s) in guild {}", synced.len(), guild_id);
                }
                Ok((guild_id, Err(e))) => {
                    tracing::error!("Command registration failed for guild {}: {}", guild_id, e);
                }
                Err(e) => tracing::error!("Command registration task aborted: {}", e),
            }
        }
    }

    pub async fn on_interaction(&self, event: InteractionEvent) -> DispatchOutcome {
        self.dispatcher.dispatch(event).await
    }

    /// Consume gateway events until the stream closes.
    ///
    /// Each event is handled on its own task; a slow or failing event never
    /// holds up the others.
    pub async fn run(&self, mut events: mpsc::Receiver<GatewayEvent>) -> Result<(), BotError> {
        let mut tasks = JoinSet::new();

        while let Some(event) = events.recv().await {
            let session = self.clone();
            match event {
                GatewayEvent::Ready { guild_ids } => {
                    tasks.spawn(async move { session.on_ready(guild_ids).await });
                }
                GatewayEvent::Interaction(interaction) => {
                    tasks.spawn(async move {
                        session.on_interaction(interaction).await;
                    });
                }
            }

            while let Some(done) = tasks.try_join_next() {
                log_task_result(done);
            }
        }

        tracing::info!("Gateway event stream closed, waiting for {} pending task(s)", tasks.len());
        while let Some(done) = tasks.join_next().await {
            log_task_result(done);
        }
        Ok(())
    }
}

fn log_task_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!("Event task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ArgumentValue, Channel, UserId};
    use crate::infrastructure::adapters::MemoryGateway;

    fn session() -> (Arc<MemoryGateway>, BotSession) {
        let gateway = Arc::new(MemoryGateway::new());
        let session = BotSession::new(&AppContext::default(), gateway.clone()).unwrap();
        (gateway, session)
    }

    #[tokio::test]
    async fn test_on_ready_registers_every_guild() {
        let (gateway, session) = session();
        session.on_ready(vec![GuildId(1), GuildId(2)]).await;

        assert_eq!(session.directory().guilds(), vec![GuildId(1), GuildId(2)]);
        assert_eq!(gateway.remote_commands(GuildId(2)).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_guild_does_not_stop_others() {
        let (gateway, session) = session();
        gateway.fail_next_pushes(1);
        session.on_ready(vec![GuildId(1), GuildId(2)]).await;

        assert_eq!(session.directory().guilds().len(), 1);
        assert_eq!(gateway.push_count(), 1);
    }

    #[tokio::test]
    async fn test_run_handles_events_until_close() {
        let (gateway, session) = session();
        let (tx, rx) = mpsc::channel(8);

        tx.send(GatewayEvent::Ready {
            guild_ids: vec![GuildId(5)],
        })
        .await
        .unwrap();
        drop(tx);
        session.run(rx).await.unwrap();
        assert_eq!(gateway.push_count(), 1);

        let event = InteractionEvent::new(5, 6, "vouch")
            .with_channel(Channel::text(7))
            .with_argument("person", ArgumentValue::User(UserId(8)));
        let outcome = session.on_interaction(event).await;
        assert_eq!(outcome, DispatchOutcome::Completed { delivery_failures: 0 });
        assert_eq!(gateway.responses().len(), 1);
    }
}
