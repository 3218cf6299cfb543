// This is the entry point of the registration bot.
//
// **Architecture Overview:**
// - `core/` = Registration logic (platform-agnostic, talks to a GuildGateway port)
// - `infra/` = Serenity gateway implementation and startup configuration
// - `discord/` = Discord-specific adapters (commands, events, panel)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize the registration service
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::registration::RegistrationService;
use crate::discord::commands::presence;
use crate::discord::registration::{events as registration_events, panel};
use crate::discord::{Data, Error};
use crate::infra::config::{load_registration_config, BotConfig};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = registration_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!(
                    guild_id = %new_member.guild_id,
                    user_id = %new_member.user.id,
                    "Failed to restrict new member: {:#}",
                    e
                );
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = panel::handle_interaction(ctx, data, interaction).await {
                tracing::error!("Error handling registration panel interaction: {:#}", e);
            }
        }

        _ => {}
    }

    Ok(())
}

/// Log every framework error and tell the invoker their command failed.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = %ctx.author().id,
                "Command failed: {}",
                error
            );
            let reply = poise::CreateReply::default()
                .content(format!("❌ Erro: {}", error))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::warn!("Failed to report command error: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling framework error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists), RUST_LOG included
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bot_config = BotConfig::from_env().context("Invalid bot configuration")?;
    let (settings, blueprint) = load_registration_config(&bot_config.config_path)
        .context("Failed to load registration config")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let registration = Arc::new(RegistrationService::new(settings, blueprint));
    tracing::info!(
        unregistered_role = %registration.settings().unregistered_role,
        registered_role = %registration.settings().registered_role,
        registration_channel = %registration.settings().channel_name,
        managed_roles = registration.blueprint().roles.len(),
        managed_categories = registration.blueprint().categories.len(),
        "Registration service ready"
    );

    let data = Data { registration };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // GUILD_MEMBERS is privileged: enable "Server Members Intent" in the developer portal.
    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;

    let dev_guild_id = bot_config.dev_guild_id;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::registration::registrar(),
                discord::commands::registration::verificar_registro(),
                discord::commands::setup::setup(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Bot is starting up");

                // Global registration can take up to an hour to propagate; a dev
                // guild gets the commands immediately.
                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        tracing::info!(guild_id, "Commands registered in development guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        tracing::info!("Commands registered globally");
                    }
                }

                presence::on_ready(ctx);
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&bot_config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
