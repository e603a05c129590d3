//! Domain layer - Core bot objects with no transport dependencies
//! 
//! This layer contains:
//! - Entities: Commands, interactions, gateway events
//! - Traits: Abstractions for the gateway and command handlers

pub mod entities;
pub mod traits;
