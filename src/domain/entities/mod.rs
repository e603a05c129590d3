//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod event;
pub mod ids;
pub mod interaction;

pub use command::{Command, CommandParameter, GuildCommandSet, ParameterKind};
pub use event::GatewayEvent;
pub use ids::{ChannelId, GuildId, UserId};
pub use interaction::{ArgumentValue, Channel, ChannelKind, InteractionEvent, Reply};
