//! Command dispatcher - Routes interactions to handlers

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::services::GuildDirectory;
use crate::domain::entities::{InteractionEvent, Reply};
use crate::domain::traits::{CommandHandler, Gateway};
use crate::infrastructure::config::ConfigStore;

/// Ephemeral notice sent when a handler fails
pub const FAILURE_NOTICE: &str = "Sorry, something went wrong while running that command.";

/// Terminal state of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No synced command with that name in the guild
    Unmatched,
    /// The handler ran; `delivery_failures` replies could not be sent
    Completed { delivery_failures: usize },
    /// The handler failed and the invoker got the failure notice
    Failed { error: String },
}

/// Routes interactions to the handler of the matching command
pub struct CommandDispatcher {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    directory: Arc<GuildDirectory>,
    gateway: Arc<dyn Gateway>,
    config: Arc<ConfigStore>,
}

impl CommandDispatcher {
    pub fn new(gateway: Arc<dyn Gateway>, directory: Arc<GuildDirectory>, config: Arc<ConfigStore>) -> Self {
        Self {
            handlers: HashMap::new(),
            directory,
            gateway,
            config,
        }
    }

    /// Bind a handler to a command name
    pub fn register_handler<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn with_handler<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        self.register_handler(name, handler);
        self
    }

    /// Run one interaction to completion.
    ///
    /// Never fails: handler errors turn into a failure notice for the invoker
    /// and delivery errors are counted in the outcome.
    pub async fn dispatch(&self, event: InteractionEvent) -> DispatchOutcome {
        let Some(handler) = self.resolve(&event) else {
            tracing::debug!(
                "No command /{} synced for guild {}, ignoring interaction",
                event.command,
                event.guild_id
            );
            return DispatchOutcome::Unmatched;
        };

        tracing::debug!(
            "Dispatching /{} for user {} in guild {}",
            event.command,
            event.user_id,
            event.guild_id
        );
        let snapshot = self.config.snapshot();
        let result = catch_unwind(AssertUnwindSafe(|| handler.handle(&event, &snapshot)))
            .unwrap_or_else(|panic| Err(CommandError::ExecutionFailed(panic_message(panic))));

        match result {
            Ok(reply) => {
                let reply = self.fit_to_channel(&event, reply);
                let delivery_failures = self.deliver(&event, &reply).await;
                DispatchOutcome::Completed { delivery_failures }
            }
            Err(e) => {
                tracing::error!("Command /{} failed in guild {}: {}", event.command, event.guild_id, e);
                if let Err(send_err) = self.gateway.respond(&event, FAILURE_NOTICE, true).await {
                    tracing::warn!("Failed to send failure notice for /{}: {}", event.command, send_err);
                }
                DispatchOutcome::Failed { error: e.to_string() }
            }
        }
    }

    fn resolve(&self, event: &InteractionEvent) -> Option<Arc<dyn CommandHandler>> {
        let synced = self.directory.published(event.guild_id)?;
        if !synced.contains(&event.command) {
            return None;
        }
        self.handlers.get(&event.command).cloned()
    }

    /// Drop the channel message when the interaction did not come from a
    /// text channel
    fn fit_to_channel(&self, event: &InteractionEvent, mut reply: Reply) -> Reply {
        if reply.channel.is_some() && !event.in_text_channel() {
            tracing::debug!(
                "/{} invoked outside a text channel, sending acknowledgement only",
                event.command
            );
            reply.channel = None;
        }
        reply
    }

    /// Send the ephemeral reply and the channel message concurrently; both
    /// are attempted regardless of the other's outcome.
    async fn deliver(&self, event: &InteractionEvent, reply: &Reply) -> usize {
        let ephemeral = async {
            match &reply.ephemeral {
                Some(text) => self.gateway.respond(event, text, true).await.err(),
                None => None,
            }
        };
        let channel = async {
            match (&reply.channel, event.channel) {
                (Some(text), Some(channel)) => self.gateway.send_message(channel.id, text).await.err(),
                _ => None,
            }
        };

        let (ephemeral, channel) = tokio::join!(ephemeral, channel);
        let mut failures = 0;
        if let Some(e) = ephemeral {
            tracing::warn!("Failed to respond to /{}: {}", event.command, e);
            failures += 1;
        }
        if let Some(e) = channel {
            tracing::warn!("Failed to post /{} message to channel: {}", event.command, e);
            failures += 1;
        }
        failures
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::CommandRegistry;
    use crate::domain::entities::{Channel, GuildId};
    use crate::infrastructure::adapters::MemoryGateway;
    use crate::infrastructure::config::ConfigSnapshot;

    fn echo(event: &InteractionEvent, _config: &ConfigSnapshot) -> Result<Reply, CommandError> {
        let text = event.string_arg("text")?;
        Ok(Reply::ephemeral(format!("ack {}", text)).with_channel_message(format!("said {}", text)))
    }

    async fn setup() -> (Arc<MemoryGateway>, CommandDispatcher) {
        let gateway = Arc::new(MemoryGateway::new());
        let directory = Arc::new(GuildDirectory::new());
        directory
            .register(GuildId(1), gateway.as_ref(), |registry: &mut CommandRegistry| {
                registry
                    .declare("echo", "Echo", Vec::new())?
                    .declare("boom", "Panics", Vec::new())?;
                Ok(())
            })
            .await
            .unwrap();

        let dispatcher = CommandDispatcher::new(gateway.clone(), directory, Arc::new(ConfigStore::default()))
            .with_handler("echo", echo)
            .with_handler("boom", |_: &InteractionEvent, _: &ConfigSnapshot| -> Result<Reply, CommandError> {
                panic!("kaboom")
            })
            .with_handler("unsynced", echo);
        (gateway, dispatcher)
    }

    fn echo_event(text: &str) -> InteractionEvent {
        InteractionEvent::new(1, 2, "echo")
            .with_channel(Channel::text(3))
            .with_argument("text", crate::domain::entities::ArgumentValue::String(text.to_string()))
    }

    #[tokio::test]
    async fn test_dispatch_delivers_both_replies() {
        let (gateway, dispatcher) = setup().await;
        let outcome = dispatcher.dispatch(echo_event("hi")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { delivery_failures: 0 });
        assert_eq!(gateway.responses()[0].content, "ack hi");
        assert!(gateway.responses()[0].ephemeral);
        assert_eq!(gateway.messages()[0].content, "said hi");
    }

    #[tokio::test]
    async fn test_unmatched_names() {
        let (gateway, dispatcher) = setup().await;

        let wrong_case = InteractionEvent::new(1, 2, "Echo");
        assert_eq!(dispatcher.dispatch(wrong_case).await, DispatchOutcome::Unmatched);

        let other_guild = InteractionEvent::new(99, 2, "echo");
        assert_eq!(dispatcher.dispatch(other_guild).await, DispatchOutcome::Unmatched);

        let not_synced = InteractionEvent::new(1, 2, "unsynced");
        assert_eq!(dispatcher.dispatch(not_synced).await, DispatchOutcome::Unmatched);

        assert!(gateway.responses().is_empty());
        assert!(gateway.messages().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_sends_notice() {
        let (gateway, dispatcher) = setup().await;
        let missing_arg = InteractionEvent::new(1, 2, "echo").with_channel(Channel::text(3));

        let outcome = dispatcher.dispatch(missing_arg).await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(gateway.responses().len(), 1);
        assert_eq!(gateway.responses()[0].content, FAILURE_NOTICE);
        assert!(gateway.messages().is_empty());
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let (gateway, dispatcher) = setup().await;
        let outcome = dispatcher.dispatch(InteractionEvent::new(1, 2, "boom")).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { ref error } if error.contains("kaboom")));
        assert_eq!(gateway.responses()[0].content, FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_one_failed_delivery_does_not_block_other() {
        let (gateway, dispatcher) = setup().await;
        gateway.fail_responses(true);

        let outcome = dispatcher.dispatch(echo_event("hi")).await;
        assert_eq!(outcome, DispatchOutcome::Completed { delivery_failures: 1 });
        assert_eq!(gateway.messages().len(), 1);
    }
}
