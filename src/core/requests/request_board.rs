// The "port" the request lifecycle uses to talk to the chat platform.
//
// The core decides WHAT gets posted and WHERE; the Discord layer decides how
// it is rendered (embeds, buttons, mentions).

use super::request_models::{MessageRef, NoticeTarget, Request, Submission};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Channel {0} not found")]
    ChannelNotFound(u64),
    #[error("Platform error: {0}")]
    Platform(String),
}

#[async_trait]
pub trait RequestBoard: Send + Sync {
    /// Whether `channel_id` resolves inside `guild_id`.
    async fn channel_in_guild(&self, guild_id: u64, channel_id: u64) -> Result<bool, BoardError>;

    /// Post the decorative media item that precedes every announcement.
    async fn post_media(&self, channel_id: u64, url: &str) -> Result<(), BoardError>;

    /// Post the role ping, embed and an enabled claim control.
    async fn post_announcement(
        &self,
        channel_id: u64,
        submission: &Submission,
    ) -> Result<MessageRef, BoardError>;

    /// Open a companion thread off the announcement. Returns the thread id.
    async fn open_thread(&self, announcement: MessageRef, title: &str) -> Result<u64, BoardError>;

    /// Re-render the announcement's claim control from `request.claim`.
    async fn render_claim_control(&self, request: &Request) -> Result<(), BoardError>;

    /// Announce who claimed the request.
    async fn post_claim_notice(
        &self,
        target: NoticeTarget,
        request: &Request,
    ) -> Result<(), BoardError>;
}
