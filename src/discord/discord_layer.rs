// Discord layer - commands and event handlers.

#[path = "automod/mod.rs"]
pub mod automod;

#[path = "commands/command_catalog.rs"]
pub mod commands;

// Re-export command types for convenience
pub use commands::automod::{Data, Error};
