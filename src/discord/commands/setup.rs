use crate::discord::registration::messages;
use crate::discord::{Context, Error};
use crate::infra::guild::SerenityGuild;

/// Create or resync the registration roles, channels and permissions.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Use isso dentro de um servidor.")?;

    ctx.defer_ephemeral().await?;
    tracing::info!(guild_id = %guild_id, invoked_by = %ctx.author().id, "Running /setup");

    let guild = SerenityGuild::new(ctx.serenity_context().http.clone(), guild_id);
    let reply = match ctx.data().registration.setup(&guild).await {
        Ok(report) => {
            tracing::info!(guild_id = %guild_id, ?report, "Setup finished");
            messages::setup_summary(&report)
        }
        Err(e) => {
            // Whatever was created before the failure stays in place.
            tracing::error!(guild_id = %guild_id, "Setup failed: {}", e);
            format!(
                "{}\nO setup parou no meio; rode `/setup` de novo depois de corrigir.",
                messages::describe_error(&e)
            )
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}
