// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "requests/mod.rs"]
pub mod requests;

// Re-export command types for convenience
pub use commands::{Data, Error};
