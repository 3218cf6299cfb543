use crate::core::registration::JoinOutcome;
use crate::discord::Data;
use crate::infra::guild::SerenityGuild;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

/// Restrict a member that just joined to the registration channel.
///
/// Failures are returned to the caller for logging; nothing is retried.
pub async fn handle_member_join(
    ctx: &Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<()> {
    let guild_id = member.guild_id;
    let user_id = member.user.id.get();
    let guild = SerenityGuild::new(ctx.http.clone(), guild_id);

    let outcome = data
        .registration
        .handle_member_join(&guild, user_id)
        .await?;

    match outcome {
        JoinOutcome::Restricted { pinged } => {
            tracing::info!(guild_id = %guild_id, user_id, pinged, "New member restricted until registration");
        }
        JoinOutcome::NotConfigured => {
            tracing::warn!(guild_id = %guild_id, user_id, "Member joined before /setup created the registration roles");
        }
        JoinOutcome::Disabled | JoinOutcome::AlreadyRegistered | JoinOutcome::AlreadyRestricted => {
            tracing::debug!(guild_id = %guild_id, user_id, ?outcome, "Member join left untouched");
        }
    }

    Ok(())
}
