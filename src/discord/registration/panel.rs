// Registration panel: the "Cadastrar" button posted by /setup and the modal
// it opens. Submitting the modal runs the same flow as /registrar.

use super::messages;
use crate::core::registration::{
    GAME_NAME_INPUT_ID, NICKNAME_MAX_CHARS, REGISTER_BUTTON_ID, REGISTER_MODAL_ID,
};
use crate::discord::Data;
use crate::infra::guild::SerenityGuild;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

const MIN_NAME_CHARS: u16 = 3;

/// Route component and modal interactions that belong to the panel.
/// Anything else is ignored.
pub async fn handle_interaction(
    ctx: &Context,
    data: &Data,
    interaction: &serenity::Interaction,
) -> Result<()> {
    match interaction {
        serenity::Interaction::Component(component)
            if component.data.custom_id == REGISTER_BUTTON_ID =>
        {
            let modal = register_modal(&data.registration.settings().nickname_prefix);
            component
                .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                .await?;
            Ok(())
        }
        serenity::Interaction::Modal(modal) if modal.data.custom_id == REGISTER_MODAL_ID => {
            submit_register_modal(ctx, data, modal).await
        }
        _ => Ok(()),
    }
}

/// Longest in-game name that still fits Discord's nickname limit.
fn max_name_chars(prefix: &str) -> u16 {
    let room = NICKNAME_MAX_CHARS.saturating_sub(prefix.chars().count());
    (room as u16).max(MIN_NAME_CHARS)
}

fn register_modal(prefix: &str) -> serenity::CreateModal {
    let name_input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Short,
        "Seu nome no jogo",
        GAME_NAME_INPUT_ID,
    )
    .placeholder("Ex: Sam Cherri")
    .min_length(MIN_NAME_CHARS)
    .max_length(max_name_chars(prefix))
    .required(true);

    serenity::CreateModal::new(REGISTER_MODAL_ID, "Cadastro")
        .components(vec![serenity::CreateActionRow::InputText(name_input)])
}

fn input_value(rows: &[serenity::ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

async fn submit_register_modal(
    ctx: &Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
) -> Result<()> {
    let Some(guild_id) = modal.guild_id else {
        modal
            .create_response(
                &ctx.http,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content("Use isso dentro de um servidor.")
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    };

    // Nickname and role calls can take longer than the 3s interaction window.
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let name = input_value(&modal.data.components, GAME_NAME_INPUT_ID).unwrap_or_default();
    let user_id = modal.user.id.get();
    let guild = SerenityGuild::new(ctx.http.clone(), guild_id);

    let reply = match data.registration.register(&guild, user_id, &name).await {
        Ok(outcome) => {
            tracing::info!(guild_id = %guild_id, user_id, nickname = %outcome.nickname, "Member registered via panel");
            messages::registration_success(&outcome)
        }
        Err(e) => {
            tracing::warn!(guild_id = %guild_id, user_id, "Panel registration failed: {}", e);
            messages::describe_error(&e)
        }
    };

    modal
        .edit_response(&ctx.http, serenity::EditInteractionResponse::new().content(reply))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_name_chars_leaves_room_for_prefix() {
        assert_eq!(max_name_chars("Rec "), 28);
        assert_eq!(max_name_chars(""), 32);
        assert_eq!(max_name_chars(&"x".repeat(40)), MIN_NAME_CHARS);
    }
}
