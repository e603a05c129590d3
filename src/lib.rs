//! McVouchy - A chat bot for invitation and vouching workflows
//!
//! Slash commands are registered per guild whenever the gateway reports it
//! is ready, and interactions are dispatched to their handlers concurrently.

pub mod application;
pub mod domain;
pub mod infrastructure;
