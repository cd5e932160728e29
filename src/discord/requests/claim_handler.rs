// Claim button handling.
//
// Every click on a `claim_request` button lands here, gets routed to its
// request by announcement message id, and the core decides what happens.

use super::render::CLAIM_BUTTON_ID;
use crate::core::requests::{ClaimOutcome, Claimant};
use crate::discord::{Data, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

const NOT_AUTHORIZED: &str = "only uploaders can claim this request.";
const NOT_TRACKED: &str = "this request is no longer open for claims.";

/// Handle a component interaction. Anything that isn't a claim click is ignored.
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    if interaction.data.custom_id != CLAIM_BUTTON_ID {
        return Ok(());
    }

    let message_id = interaction.message.id.get();
    let claimant = resolve_claimant(ctx, interaction).await?;

    match data.requests.claim(message_id, &claimant).await? {
        ClaimOutcome::Unauthorized => {
            tracing::debug!(
                message_id,
                user_id = claimant.user_id,
                "Rejected claim from non-uploader"
            );
            reply_privately(ctx, interaction, NOT_AUTHORIZED).await?;
        }
        ClaimOutcome::NotTracked => {
            reply_privately(ctx, interaction, NOT_TRACKED).await?;
        }
        ClaimOutcome::AlreadyClaimed { by } => {
            let content = format!(
                "this request was already claimed by {}.",
                serenity::UserId::new(by).mention()
            );
            reply_privately(ctx, interaction, content).await?;
        }
        ClaimOutcome::Claimed(request) => {
            // The claim is already recorded, so a failed ack must not stop
            // the button from being disabled.
            if let Err(e) = interaction.defer(&ctx.http).await {
                tracing::warn!("Failed to acknowledge claim interaction: {}", e);
            }
            data.requests.complete_claim(&request).await?;
        }
    }

    Ok(())
}

/// The clicking user plus the roles they hold in the guild.
async fn resolve_claimant(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
) -> Result<Claimant, Error> {
    let user_id = interaction.user.id;

    let role_ids = match (&interaction.member, interaction.guild_id) {
        (Some(member), _) => member.roles.iter().map(|r| r.get()).collect(),
        (None, Some(guild_id)) => guild_id
            .member(&ctx.http, user_id)
            .await?
            .roles
            .iter()
            .map(|r| r.get())
            .collect(),
        (None, None) => Vec::new(),
    };

    Ok(Claimant {
        user_id: user_id.get(),
        role_ids,
    })
}

async fn reply_privately(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
