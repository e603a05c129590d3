use crate::application::errors::CommandError;
use crate::domain::entities::{InteractionEvent, Reply};
use crate::infrastructure::config::ConfigSnapshot;

/// Maps one interaction to the replies it produces
///
/// Handlers hold no per-event state and never talk to the gateway
/// themselves; the dispatcher delivers the returned [`Reply`].
pub trait CommandHandler: Send + Sync {
    fn handle(&self, event: &InteractionEvent, config: &ConfigSnapshot) -> Result<Reply, CommandError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&InteractionEvent, &ConfigSnapshot) -> Result<Reply, CommandError> + Send + Sync,
{
    fn handle(&self, event: &InteractionEvent, config: &ConfigSnapshot) -> Result<Reply, CommandError> {
        self(event, config)
    }
}
