// Serenity implementation of the GuildGateway port.
//
// Converts between serenity models and the core's plain u64-based models and
// maps HTTP failures onto GuildError so the core can tell a missing
// permission apart from a rejected input.

use crate::core::registration::{
    AccessSet, ChannelKind, ChannelRequest, ChannelUpdate, GuildChannel, GuildError,
    GuildGateway, GuildMember, GuildRole, OutgoingMessage, PermissionGrant, RoleSpec,
    REGISTER_BUTTON_ID,
};
use ::serenity::http::HttpError;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Discord caps a member list page at this many entries.
const MEMBERS_PAGE_SIZE: u64 = 1000;

const PANEL_TEXT: &str = "📋 **REGISTRO OBRIGATÓRIO**\n\n\
    Clique no botão abaixo para se cadastrar e liberar o servidor.";

impl From<serenity::Error> for GuildError {
    fn from(err: serenity::Error) -> Self {
        match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                let message = response.error.message.clone();
                match response.status_code.as_u16() {
                    400 => GuildError::Rejected(message),
                    403 => GuildError::Forbidden(message),
                    404 => GuildError::NotFound(message),
                    429 => GuildError::RateLimited,
                    _ => GuildError::Api(message),
                }
            }
            _ => GuildError::Api(err.to_string()),
        }
    }
}

fn to_permissions(access: AccessSet) -> serenity::Permissions {
    let mut permissions = serenity::Permissions::empty();
    if access.view {
        permissions |= serenity::Permissions::VIEW_CHANNEL;
    }
    if access.send {
        permissions |= serenity::Permissions::SEND_MESSAGES;
    }
    if access.read_history {
        permissions |= serenity::Permissions::READ_MESSAGE_HISTORY;
    }
    permissions
}

fn to_access(permissions: serenity::Permissions) -> AccessSet {
    AccessSet {
        view: permissions.contains(serenity::Permissions::VIEW_CHANNEL),
        send: permissions.contains(serenity::Permissions::SEND_MESSAGES),
        read_history: permissions.contains(serenity::Permissions::READ_MESSAGE_HISTORY),
    }
}

fn to_overwrite(grant: &PermissionGrant) -> serenity::PermissionOverwrite {
    serenity::PermissionOverwrite {
        allow: to_permissions(grant.allow),
        deny: to_permissions(grant.deny),
        kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(grant.role_id)),
    }
}

fn to_role(role: &serenity::Role) -> GuildRole {
    GuildRole {
        id: role.id.get(),
        name: role.name.clone(),
        color: role.colour.0,
        hoist: role.hoist,
        mentionable: role.mentionable,
    }
}

fn to_member(member: &serenity::Member) -> GuildMember {
    GuildMember {
        user_id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        nickname: member.nick.clone(),
        role_ids: member.roles.iter().map(|id| id.get()).collect(),
        joined_at: member.joined_at.map(|t| *t),
    }
}

fn channel_type(kind: ChannelKind) -> serenity::ChannelType {
    match kind {
        ChannelKind::Category => serenity::ChannelType::Category,
        ChannelKind::Text => serenity::ChannelType::Text,
        ChannelKind::Voice => serenity::ChannelType::Voice,
    }
}

/// Channels of other types (forums, stages, threads) are never managed.
fn to_channel(channel: &serenity::GuildChannel) -> Option<GuildChannel> {
    let kind = match channel.kind {
        serenity::ChannelType::Category => ChannelKind::Category,
        serenity::ChannelType::Text => ChannelKind::Text,
        serenity::ChannelType::Voice => ChannelKind::Voice,
        _ => return None,
    };

    let overwrites = channel
        .permission_overwrites
        .iter()
        .filter_map(|o| match o.kind {
            serenity::PermissionOverwriteType::Role(role_id) => Some(PermissionGrant {
                role_id: role_id.get(),
                allow: to_access(o.allow),
                deny: to_access(o.deny),
            }),
            _ => None,
        })
        .collect();

    Some(GuildChannel {
        id: channel.id.get(),
        name: channel.name.clone(),
        kind,
        parent_id: channel.parent_id.map(|id| id.get()),
        topic: channel.topic.clone(),
        slowmode_secs: channel.rate_limit_per_user.unwrap_or(0),
        user_limit: channel.user_limit.unwrap_or(0),
        overwrites,
    })
}

fn edit_role_builder<'a>(spec: &RoleSpec, reason: &'a str) -> serenity::EditRole<'a> {
    serenity::EditRole::new()
        .name(spec.name.clone())
        .colour(spec.color)
        .hoist(spec.hoist)
        .mentionable(spec.mentionable)
        .audit_log_reason(reason)
}

/// The "Cadastrar" button that opens the registration modal.
fn register_button_row() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(REGISTER_BUTTON_ID)
        .label("Cadastrar")
        .emoji('✅')
        .style(serenity::ButtonStyle::Success)])
}

/// One guild, reached over Discord's REST API.
pub struct SerenityGuild {
    http: Arc<serenity::Http>,
    guild_id: serenity::GuildId,
}

impl SerenityGuild {
    pub fn new(http: Arc<serenity::Http>, guild_id: serenity::GuildId) -> Self {
        Self { http, guild_id }
    }
}

#[async_trait]
impl GuildGateway for SerenityGuild {
    fn everyone_role_id(&self) -> u64 {
        // @everyone role ID is same as guild ID
        self.guild_id.get()
    }

    async fn roles(&self) -> Result<Vec<GuildRole>, GuildError> {
        let roles = self.guild_id.roles(&*self.http).await?;
        Ok(roles.values().map(to_role).collect())
    }

    async fn create_role(&self, spec: &RoleSpec) -> Result<GuildRole, GuildError> {
        let role = self
            .guild_id
            .create_role(&*self.http, edit_role_builder(spec, "Setup (create role)"))
            .await?;
        tracing::info!(guild_id = %self.guild_id, role = %spec.name, "Created role");
        Ok(to_role(&role))
    }

    async fn edit_role(&self, role_id: u64, spec: &RoleSpec) -> Result<(), GuildError> {
        self.guild_id
            .edit_role(
                &*self.http,
                serenity::RoleId::new(role_id),
                edit_role_builder(spec, "Sync config (role)"),
            )
            .await?;
        Ok(())
    }

    async fn member(&self, user_id: u64) -> Result<GuildMember, GuildError> {
        let member = self
            .guild_id
            .member(&*self.http, serenity::UserId::new(user_id))
            .await?;
        Ok(to_member(&member))
    }

    async fn members(&self) -> Result<Vec<GuildMember>, GuildError> {
        let mut all = Vec::new();
        let mut after = None;

        loop {
            let page = self
                .guild_id
                .members(&*self.http, Some(MEMBERS_PAGE_SIZE), after)
                .await?;
            let full_page = page.len() as u64 == MEMBERS_PAGE_SIZE;
            after = page.last().map(|m| m.user.id);
            all.extend(page.iter().map(to_member));

            if !full_page {
                break;
            }
        }

        Ok(all)
    }

    async fn add_member_role(
        &self,
        user_id: u64,
        role_id: u64,
        reason: &str,
    ) -> Result<(), GuildError> {
        self.http
            .add_member_role(
                self.guild_id,
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(reason),
            )
            .await?;
        Ok(())
    }

    async fn remove_member_role(
        &self,
        user_id: u64,
        role_id: u64,
        reason: &str,
    ) -> Result<(), GuildError> {
        self.http
            .remove_member_role(
                self.guild_id,
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(reason),
            )
            .await?;
        Ok(())
    }

    async fn set_nickname(&self, user_id: u64, nickname: &str) -> Result<(), GuildError> {
        self.guild_id
            .edit_member(
                &*self.http,
                serenity::UserId::new(user_id),
                serenity::EditMember::new()
                    .nickname(nickname)
                    .audit_log_reason("Cadastro: set nickname"),
            )
            .await?;
        Ok(())
    }

    async fn channels(&self) -> Result<Vec<GuildChannel>, GuildError> {
        let channels = self.guild_id.channels(&*self.http).await?;
        Ok(channels.values().filter_map(to_channel).collect())
    }

    async fn create_channel(&self, request: &ChannelRequest) -> Result<GuildChannel, GuildError> {
        let mut builder = serenity::CreateChannel::new(request.name.clone())
            .kind(channel_type(request.kind))
            .permissions(request.overwrites.iter().map(to_overwrite))
            .audit_log_reason("Setup (create channel)");

        if let Some(parent_id) = request.parent_id {
            builder = builder.category(serenity::ChannelId::new(parent_id));
        }
        match request.kind {
            ChannelKind::Text => {
                if let Some(topic) = &request.topic {
                    builder = builder.topic(topic.clone());
                }
                if request.slowmode_secs > 0 {
                    builder = builder.rate_limit_per_user(request.slowmode_secs);
                }
            }
            ChannelKind::Voice => {
                builder = builder.user_limit(request.user_limit);
            }
            ChannelKind::Category => {}
        }

        let channel = self.guild_id.create_channel(&*self.http, builder).await?;
        tracing::info!(guild_id = %self.guild_id, channel = %request.name, "Created channel");

        to_channel(&channel).ok_or_else(|| {
            GuildError::Api(format!("unexpected channel type for `{}`", request.name))
        })
    }

    async fn edit_channel(&self, channel_id: u64, update: &ChannelUpdate) -> Result<(), GuildError> {
        let mut builder = serenity::EditChannel::new().audit_log_reason("Sync config (channel)");
        if let Some(topic) = &update.topic {
            builder = builder.topic(topic.clone());
        }
        if let Some(slowmode) = update.slowmode_secs {
            builder = builder.rate_limit_per_user(slowmode);
        }
        if let Some(limit) = update.user_limit {
            builder = builder.user_limit(limit);
        }

        serenity::ChannelId::new(channel_id)
            .edit(&*self.http, builder)
            .await?;
        Ok(())
    }

    async fn set_permission(
        &self,
        channel_id: u64,
        grant: &PermissionGrant,
    ) -> Result<(), GuildError> {
        serenity::ChannelId::new(channel_id)
            .create_permission(&*self.http, to_overwrite(grant))
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<(), GuildError> {
        let builder = match message {
            OutgoingMessage::Text(text) => serenity::CreateMessage::new().content(text.clone()),
            OutgoingMessage::RegistrationPanel => serenity::CreateMessage::new()
                .content(PANEL_TEXT)
                .components(vec![register_button_row()]),
        };

        serenity::ChannelId::new(channel_id)
            .send_message(&*self.http, builder)
            .await?;
        Ok(())
    }
}
