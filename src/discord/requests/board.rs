// Serenity implementation of the request and reminder ports.
//
// This is the only place that turns core ids into API calls.

use super::render;
use crate::core::reminders::{ReminderError, ReminderSink};
use crate::core::requests::{BoardError, MessageRef, NoticeTarget, Request, RequestBoard, Submission};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Threads auto-archive after a day without activity.
const THREAD_ARCHIVE: serenity::AutoArchiveDuration = serenity::AutoArchiveDuration::OneDay;

pub struct SerenityBoard {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    role_id: u64,
    embed_color: u32,
}

impl SerenityBoard {
    pub fn new(
        http: Arc<serenity::Http>,
        cache: Arc<serenity::Cache>,
        role_id: u64,
        embed_color: u32,
    ) -> Self {
        Self {
            http,
            cache,
            role_id,
            embed_color,
        }
    }

    fn http(&self) -> &serenity::Http {
        &self.http
    }
}

fn platform(e: serenity::Error) -> BoardError {
    BoardError::Platform(e.to_string())
}

fn is_not_found(e: &serenity::Error) -> bool {
    matches!(
        e,
        serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

#[async_trait]
impl RequestBoard for SerenityBoard {
    async fn channel_in_guild(&self, guild_id: u64, channel_id: u64) -> Result<bool, BoardError> {
        let guild_id = serenity::GuildId::new(guild_id);
        let channel_id = serenity::ChannelId::new(channel_id);

        // Cache first; the guard must be dropped before any await.
        let cached = self
            .cache
            .guild(guild_id)
            .map(|guild| guild.channels.contains_key(&channel_id));
        if let Some(found) = cached {
            return Ok(found);
        }

        // Guild not cached (e.g. right after startup) - ask the API instead.
        let channels = guild_id.channels(self.http()).await.map_err(platform)?;
        Ok(channels.contains_key(&channel_id))
    }

    async fn post_media(&self, channel_id: u64, url: &str) -> Result<(), BoardError> {
        let channel_id = serenity::ChannelId::new(channel_id);
        match channel_id.say(self.http(), url).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Err(BoardError::ChannelNotFound(channel_id.get())),
            Err(e) => Err(platform(e)),
        }
    }

    async fn post_announcement(
        &self,
        channel_id: u64,
        submission: &Submission,
    ) -> Result<MessageRef, BoardError> {
        let channel = serenity::ChannelId::new(channel_id);
        let builder = render::announcement_message(self.role_id, self.embed_color, submission);

        let message = match channel.send_message(self.http(), builder).await {
            Ok(message) => message,
            Err(e) if is_not_found(&e) => return Err(BoardError::ChannelNotFound(channel_id)),
            Err(e) => return Err(platform(e)),
        };

        Ok(MessageRef {
            channel_id,
            message_id: message.id.get(),
        })
    }

    async fn open_thread(&self, announcement: MessageRef, title: &str) -> Result<u64, BoardError> {
        let channel = serenity::ChannelId::new(announcement.channel_id);
        let thread = channel
            .create_thread_from_message(
                self.http(),
                serenity::MessageId::new(announcement.message_id),
                serenity::CreateThread::new(title).auto_archive_duration(THREAD_ARCHIVE),
            )
            .await
            .map_err(platform)?;

        Ok(thread.id.get())
    }

    async fn render_claim_control(&self, request: &Request) -> Result<(), BoardError> {
        let channel = serenity::ChannelId::new(request.announcement.channel_id);
        channel
            .edit_message(
                self.http(),
                serenity::MessageId::new(request.announcement.message_id),
                serenity::EditMessage::new().components(render::claim_components(&request.claim)),
            )
            .await
            .map_err(platform)?;
        Ok(())
    }

    async fn post_claim_notice(
        &self,
        target: NoticeTarget,
        request: &Request,
    ) -> Result<(), BoardError> {
        let mut builder = serenity::CreateMessage::new()
            .content(render::claim_notice(request))
            .allowed_mentions(serenity::CreateAllowedMentions::new().all_users(true));

        let channel = match target {
            NoticeTarget::Thread(thread_id) => serenity::ChannelId::new(thread_id),
            NoticeTarget::Reply(announcement) => {
                let channel = serenity::ChannelId::new(announcement.channel_id);
                builder = builder.reference_message((
                    channel,
                    serenity::MessageId::new(announcement.message_id),
                ));
                channel
            }
        };

        channel
            .send_message(self.http(), builder)
            .await
            .map_err(platform)?;
        Ok(())
    }
}

/// Sends the periodic reminder through the REST API.
pub struct SerenityReminderSink {
    http: Arc<serenity::Http>,
}

impl SerenityReminderSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReminderSink for SerenityReminderSink {
    async fn post_reminder(&self, channel_id: u64, content: &str) -> Result<(), ReminderError> {
        let channel = serenity::ChannelId::new(channel_id);
        match channel.say(&*self.http, content).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Err(ReminderError::ChannelNotFound(channel_id)),
            Err(e) => Err(ReminderError::Platform(e.to_string())),
        }
    }
}
