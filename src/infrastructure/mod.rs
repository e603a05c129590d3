//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration discovery, parsing and typed settings
//! - Logging: Configuration driven log sinks
//! - Adapters: Gateway implementations (console, in-memory)

pub mod adapters;
pub mod config;
pub mod logging;
