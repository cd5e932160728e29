// Bot presence - the small "Watching for /req" line under the bot's name.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so members can see how to file a request.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("for /req");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
