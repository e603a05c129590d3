//! Application layer - Use cases and bot orchestration
//! 
//! This layer contains:
//! - Context: The owned configuration and logging context
//! - Services: Command registration and the gateway session
//! - Messaging: Interaction dispatch and command handlers
//! - Errors: Domain-specific errors

pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;

pub use context::AppContext;
