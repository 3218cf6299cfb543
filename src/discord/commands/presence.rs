// Bot presence.
//
// Discord-layer glue only: points members at the registration command so the
// bot's status doubles as a hint.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so the default presence is set in one place.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("novos membros | /registrar");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
