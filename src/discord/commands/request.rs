// Discord command for posting a request.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call the core request service
// 3. Answer the requester privately based on the result

use crate::core::requests::{RequestError, Submission};
use crate::discord::commands::{Context, Error};

/// Post a new request
#[poise::command(slash_command, guild_only)]
pub async fn req(
    ctx: Context<'_>,
    #[description = "Your request"]
    #[min_length = 1]
    #[max_length = 2000]
    request: String,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let requests = &ctx.data().requests;

    // Nothing is posted unless the channel resolves
    match requests.ensure_request_channel(guild_id).await {
        Ok(()) => {}
        Err(RequestError::ChannelNotFound(channel_id)) => {
            tracing::warn!(guild_id, channel_id, "Request channel not found");
            reply_privately(ctx, "Request channel not found.").await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // Acknowledge early so the interaction doesn't time out while we post
    ctx.defer_ephemeral().await?;

    let submission = Submission {
        guild_id,
        requester_id: ctx.author().id.get(),
        text: request,
    };

    match requests.submit(submission).await {
        Ok(_) => reply_privately(ctx, "your request has been posted!").await?,
        Err(e) => {
            tracing::error!(guild_id, error = %e, "Failed to post request");
            reply_privately(ctx, "your request could not be posted, please try again later.")
                .await?;
        }
    }

    Ok(())
}

async fn reply_privately(ctx: Context<'_>, content: &str) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
