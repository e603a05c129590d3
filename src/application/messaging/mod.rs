//! Interaction handling - Dispatch and the bot's slash commands

pub mod commands;
pub mod dispatcher;

pub use dispatcher::{CommandDispatcher, DispatchOutcome, FAILURE_NOTICE};
