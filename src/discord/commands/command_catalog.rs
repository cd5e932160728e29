// Discord commands module.
// Each feature gets its own command file.

use crate::core::requests::RequestService;
use crate::discord::requests::SerenityBoard;
use crate::infra::requests::InMemoryRequestStore;
use std::sync::Arc;

pub mod request;

// Bot presence management
pub mod presence;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type Requests = RequestService<SerenityBoard, InMemoryRequestStore>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub requests: Arc<Requests>,
}

/// Every command the framework should register.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![request::req()]
}
