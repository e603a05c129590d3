//! The bot's slash commands

use crate::application::errors::CommandError;
use crate::application::services::CommandRegistry;
use crate::domain::entities::{CommandParameter, InteractionEvent, Reply};
use crate::infrastructure::config::settings::describe_duration;
use crate::infrastructure::config::{ConfigSnapshot, McVouchySettings};

use super::CommandDispatcher;

pub const INVITE: &str = "invite";
pub const VOUCH: &str = "vouch";
pub const LIMITS: &str = "limits";

/// Declare every command the bot publishes in a guild
pub fn declare_commands(registry: &mut CommandRegistry) -> Result<(), CommandError> {
    registry
        .declare(
            INVITE,
            "Create a single-use invitation for a specific person",
            vec![CommandParameter::string("full_name")
                .with_description("Full name of the person you are inviting")],
        )?
        .declare(
            VOUCH,
            "Vouch for someone who just joined",
            vec![CommandParameter::user("person").with_description("The person you vouch for")],
        )?
        .declare(
            LIMITS,
            "See how many more invites and vouches you have for today",
            Vec::new(),
        )?;
    Ok(())
}

/// Bind the handlers for everything [`declare_commands`] declares
pub fn install_handlers(dispatcher: &mut CommandDispatcher) {
    dispatcher.register_handler(INVITE, invite);
    dispatcher.register_handler(VOUCH, vouch);
    dispatcher.register_handler(LIMITS, limits);
}

pub fn invite(event: &InteractionEvent, _config: &ConfigSnapshot) -> Result<Reply, CommandError> {
    let full_name = event.string_arg("full_name")?;
    tracing::info!("{} requested an invitation for {}", event.user_id, full_name);

    Ok(Reply::ephemeral(format!("Test response to `/invite`; full_name={}", full_name))
        .with_channel_message(format!(
            "{} generated an invitation for **{}**",
            event.user_id.mention(),
            full_name
        )))
}

pub fn vouch(event: &InteractionEvent, _config: &ConfigSnapshot) -> Result<Reply, CommandError> {
    let person = event.user_arg("person")?;
    tracing::info!("{} vouched for {}", event.user_id, person);

    Ok(Reply::ephemeral(format!("Test response to `/vouch`; person={}", person.mention())))
}

pub fn limits(_event: &InteractionEvent, config: &ConfigSnapshot) -> Result<Reply, CommandError> {
    let settings = McVouchySettings::from_snapshot(config)
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    let window = describe_duration(settings.limits_window);

    Ok(Reply::ephemeral(format!(
        "You can send up to {} invitations and {} vouches every {}.",
        settings.invitations_limit, settings.vouch_limit, window
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ArgumentValue, GuildId, ParameterKind, UserId};
    use crate::infrastructure::config::ConfigStore;

    #[test]
    fn test_declared_commands() {
        let mut registry = CommandRegistry::new(GuildId(1));
        declare_commands(&mut registry).unwrap();

        let set = registry.pending();
        assert_eq!(set.names().collect::<Vec<_>>(), vec![INVITE, VOUCH, LIMITS]);
        assert_eq!(
            set.get(INVITE).unwrap().parameter("full_name").unwrap().kind,
            ParameterKind::String
        );
        assert_eq!(
            set.get(VOUCH).unwrap().parameter("person").unwrap().kind,
            ParameterKind::User
        );
        assert!(set.get(LIMITS).unwrap().parameters.is_empty());
    }

    #[test]
    fn test_declaring_twice_is_duplicate() {
        let mut registry = CommandRegistry::new(GuildId(1));
        declare_commands(&mut registry).unwrap();
        assert!(matches!(
            declare_commands(&mut registry),
            Err(CommandError::Duplicate(name)) if name == INVITE
        ));
    }

    #[test]
    fn test_invite_reply() {
        let event = InteractionEvent::new(1, 42, INVITE)
            .with_argument("full_name", ArgumentValue::String("Jane Doe".to_string()));
        let reply = invite(&event, &ConfigStore::default().snapshot()).unwrap();

        assert_eq!(
            reply.ephemeral.as_deref(),
            Some("Test response to `/invite`; full_name=Jane Doe")
        );
        assert_eq!(
            reply.channel.as_deref(),
            Some("<@42> generated an invitation for **Jane Doe**")
        );
    }

    #[test]
    fn test_vouch_reply() {
        let event = InteractionEvent::new(1, 42, VOUCH)
            .with_argument("person", ArgumentValue::User(UserId(7)));
        let reply = vouch(&event, &ConfigStore::default().snapshot()).unwrap();

        assert_eq!(reply.ephemeral.as_deref(), Some("Test response to `/vouch`; person=<@7>"));
        assert!(reply.channel.is_none());
    }

    #[test]
    fn test_vouch_requires_user() {
        let event = InteractionEvent::new(1, 42, VOUCH);
        assert!(matches!(
            vouch(&event, &ConfigStore::default().snapshot()),
            Err(CommandError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_limits_reads_config() {
        let store = ConfigStore::default();
        store
            .merge("[mcvouchy]\ninvitations_limit = 5\nlimits_window = 2h\n")
            .unwrap();
        let reply = limits(&InteractionEvent::new(1, 42, LIMITS), &store.snapshot()).unwrap();

        assert_eq!(
            reply.ephemeral.as_deref(),
            Some("You can send up to 5 invitations and 3 vouches every 2 hours.")
        );
    }
}
