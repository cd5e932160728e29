// Rendering of request messages: embed text, claim button, claim notice.
//
// Everything visual about a request lives here so the board adapter only
// has to worry about which API call to make.

use crate::core::requests::{ClaimState, Request, Submission, COMPLETION_WINDOW_HOURS};
use poise::serenity_prelude::{self as serenity, Mentionable};

pub const CLAIM_BUTTON_ID: &str = "claim_request";
pub const CLAIMED_BUTTON_ID: &str = "claimed";

/// Custom id, label and disabled flag of the claim button for a given state.
pub fn claim_button_spec(state: &ClaimState) -> (&'static str, &'static str, bool) {
    match state {
        ClaimState::Unclaimed => (CLAIM_BUTTON_ID, "claim", false),
        ClaimState::Claimed { .. } => (CLAIMED_BUTTON_ID, "claimed", true),
    }
}

pub fn claim_components(state: &ClaimState) -> Vec<serenity::CreateActionRow> {
    let (custom_id, label, disabled) = claim_button_spec(state);
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(custom_id)
            .label(label)
            .style(serenity::ButtonStyle::Secondary)
            .disabled(disabled),
    ])]
}

pub fn announcement_description(requester_id: u64, text: &str) -> String {
    let requester = serenity::UserId::new(requester_id).mention();
    format!(
        "\n_ _       ˚‧︵‿   **new Request**    𓏼\n\n\
         > _ _     {requester} requested  ˚̣̣̣  **{text}**\n\n\
         -# _ _ ༯ don't claim unless you are an uploader\n\
         -# _ _ ༯ you will be **pinged** once your request is completed\n\
         -# _ _ ༯ uploaders can **click** to **claim**\n\
         _ _"
    )
}

/// Role ping + embed + an enabled claim button.
pub fn announcement_message(
    role_id: u64,
    embed_color: u32,
    submission: &Submission,
) -> serenity::CreateMessage {
    let role = serenity::RoleId::new(role_id);

    let embed = serenity::CreateEmbed::new()
        .description(announcement_description(
            submission.requester_id,
            &submission.text,
        ))
        .color(embed_color)
        .timestamp(serenity::Timestamp::now());

    serenity::CreateMessage::new()
        .content(role.mention().to_string())
        .embed(embed)
        .components(claim_components(&ClaimState::Unclaimed))
        .allowed_mentions(serenity::CreateAllowedMentions::new().roles(vec![role]))
}

pub fn claim_notice(request: &Request) -> String {
    let ClaimState::Claimed { by, .. } = request.claim else {
        return String::new();
    };

    let mut notice = format!(
        "**{} has claimed the request**\nyou have {} hours to complete it.",
        serenity::UserId::new(by).mention(),
        COMPLETION_WINDOW_HOURS
    );
    if let Some(due) = request.completion_due() {
        notice.push_str(&format!(" (due <t:{}:R>)", due.timestamp()));
    }
    notice
}
