//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;
pub mod handler;

pub use gateway::Gateway;
pub use handler::CommandHandler;
