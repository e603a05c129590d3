//! Application services - Command registration and session orchestration

pub mod command_registry;
pub mod session;

pub use command_registry::{CommandRegistry, GuildDirectory};
pub use session::BotSession;
