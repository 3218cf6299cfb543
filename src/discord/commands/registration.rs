// Registration slash commands.
//
// **Same pattern as every command file:**
// 1. Extract primitive data from Discord types
// 2. Call the core service through a SerenityGuild gateway
// 3. Format the response based on the result

use crate::discord::registration::messages;
use crate::discord::{Context, Error};
use crate::infra::guild::SerenityGuild;

/// Register yourself with your in-game name.
#[poise::command(slash_command, guild_only)]
pub async fn registrar(
    ctx: Context<'_>,
    #[description = "Seu nome no jogo"]
    #[min_length = 3]
    #[max_length = 32]
    nome: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Use isso dentro de um servidor.")?;
    let user_id = ctx.author().id.get();

    ctx.defer_ephemeral().await?;

    let guild = SerenityGuild::new(ctx.serenity_context().http.clone(), guild_id);
    let reply = match ctx.data().registration.register(&guild, user_id, &nome).await {
        Ok(outcome) => {
            tracing::info!(
                guild_id = %guild_id,
                user_id,
                nickname = %outcome.nickname,
                previous = ?outcome.previous_nickname,
                "Member registered"
            );
            messages::registration_success(&outcome)
        }
        Err(e) => {
            tracing::warn!(guild_id = %guild_id, user_id, "Registration failed: {}", e);
            messages::describe_error(&e)
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Count the members that still have not registered.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn verificar_registro(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Use isso dentro de um servidor.")?;

    ctx.defer_ephemeral().await?;

    let guild = SerenityGuild::new(ctx.serenity_context().http.clone(), guild_id);
    let reply = match ctx.data().registration.pending_registrations(&guild).await {
        Ok(report) => messages::pending_summary(&report, chrono::Utc::now()),
        Err(e) => {
            tracing::warn!(guild_id = %guild_id, "Pending registration check failed: {}", e);
            messages::describe_error(&e)
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrar_name_length_matches_panel_bounds() {
        let command = registrar()
            .create_as_slash_command()
            .expect("registrar is a slash command");
        let json = serde_json::to_value(&command).unwrap();
        let option = &json["options"][0];

        assert_eq!(option["name"], "nome");
        assert_eq!(option["required"], true);
        assert_eq!(option["min_length"], 3);
        assert_eq!(option["max_length"], 32);
    }
}
