// Registration service - core business logic for the registration flow.
//
// This service handles:
// - Restricting new members with the unregistered role
// - Registering members (nickname + role swap)
// - Scaffolding roles, categories, channels and overwrites (/setup)
// - Reporting members that never registered
//
// NO Discord dependencies here. Every platform call goes through the
// `GuildGateway` port so the whole flow runs against a fake guild in tests.

use super::registration_models::*;
use async_trait::async_trait;
use thiserror::Error;

/// How many members `pending_registrations` lists individually.
const PENDING_LIST_LIMIT: usize = 10;

// ============================================================================
// ERRORS
// ============================================================================

/// Failures reported by the platform.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GuildError {
    #[error("missing permissions: {0}")]
    Forbidden(String),

    /// The platform refused the input (invalid nickname, bad channel name...)
    #[error("rejected by Discord: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited by Discord")]
    RateLimited,

    #[error("Discord API error: {0}")]
    Api(String),
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("in-game name is empty")]
    EmptyName,

    #[error("nickname `{nickname}` is longer than {max} characters")]
    NicknameTooLong { nickname: String, max: usize },

    #[error("roles `{registered}` / `{unregistered}` do not exist yet, /setup has not run")]
    NotConfigured {
        registered: String,
        unregistered: String,
    },

    #[error("cannot change nickname: {0}")]
    NicknameForbidden(String),

    #[error("nickname rejected: {0}")]
    NicknameRejected(String),

    #[error("cannot manage member roles: {0}")]
    RolesForbidden(String),

    #[error(transparent)]
    Guild(#[from] GuildError),
}

// ============================================================================
// GATEWAY TRAIT (PORT)
// ============================================================================

/// Live access to a single guild.
///
/// Implementations talk to Discord; the service never caches what they
/// return, so every call reflects the current guild state.
#[async_trait]
pub trait GuildGateway: Send + Sync {
    /// Id of the `@everyone` role (same as the guild id on Discord).
    fn everyone_role_id(&self) -> u64;

    async fn roles(&self) -> Result<Vec<GuildRole>, GuildError>;

    async fn create_role(&self, spec: &RoleSpec) -> Result<GuildRole, GuildError>;

    async fn edit_role(&self, role_id: u64, spec: &RoleSpec) -> Result<(), GuildError>;

    async fn member(&self, user_id: u64) -> Result<GuildMember, GuildError>;

    async fn members(&self) -> Result<Vec<GuildMember>, GuildError>;

    async fn add_member_role(&self, user_id: u64, role_id: u64, reason: &str)
        -> Result<(), GuildError>;

    async fn remove_member_role(
        &self,
        user_id: u64,
        role_id: u64,
        reason: &str,
    ) -> Result<(), GuildError>;

    async fn set_nickname(&self, user_id: u64, nickname: &str) -> Result<(), GuildError>;

    async fn channels(&self) -> Result<Vec<GuildChannel>, GuildError>;

    async fn create_channel(&self, request: &ChannelRequest) -> Result<GuildChannel, GuildError>;

    async fn edit_channel(&self, channel_id: u64, update: &ChannelUpdate)
        -> Result<(), GuildError>;

    /// Create or replace the overwrite for `grant.role_id`, leaving other
    /// overwrites on the channel alone.
    async fn set_permission(&self, channel_id: u64, grant: &PermissionGrant)
        -> Result<(), GuildError>;

    async fn send_message(&self, channel_id: u64, message: &OutgoingMessage)
        -> Result<(), GuildError>;
}

// ============================================================================
// HELPERS
// ============================================================================

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Discord lowercases text channel names and turns whitespace into dashes.
fn text_channel_slug(name: &str) -> String {
    normalize(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether two names point at the same channel once Discord normalizes them.
pub fn same_channel_name(kind: ChannelKind, a: &str, b: &str) -> bool {
    match kind {
        ChannelKind::Text => text_channel_slug(a) == text_channel_slug(b),
        ChannelKind::Category | ChannelKind::Voice => normalize(a) == normalize(b),
    }
}

/// Overwrites for a managed channel.
///
/// The registration channel is only visible to unregistered members (read
/// only). Every other channel is only visible to registered members.
pub fn channel_grants(
    everyone: u64,
    registered: u64,
    unregistered: u64,
    is_registration_channel: bool,
) -> Vec<PermissionGrant> {
    if is_registration_channel {
        vec![
            PermissionGrant {
                role_id: everyone,
                allow: AccessSet::NONE,
                deny: AccessSet::VIEW,
            },
            PermissionGrant {
                role_id: unregistered,
                allow: AccessSet::READ_ONLY,
                deny: AccessSet::SEND,
            },
            PermissionGrant {
                role_id: registered,
                allow: AccessSet::NONE,
                deny: AccessSet::VIEW,
            },
        ]
    } else {
        vec![
            PermissionGrant {
                role_id: everyone,
                allow: AccessSet::NONE,
                deny: AccessSet::VIEW,
            },
            PermissionGrant {
                role_id: unregistered,
                allow: AccessSet::NONE,
                deny: AccessSet::VIEW,
            },
            PermissionGrant {
                role_id: registered,
                allow: AccessSet::FULL,
                deny: AccessSet::NONE,
            },
        ]
    }
}

fn channel_update(existing: &GuildChannel, spec: &ChannelSpec) -> ChannelUpdate {
    let mut update = ChannelUpdate::default();
    match spec.kind {
        ChannelKind::Text => {
            if spec.topic.is_some() && existing.topic != spec.topic {
                update.topic = spec.topic.clone();
            }
            if existing.slowmode_secs != spec.slowmode_secs {
                update.slowmode_secs = Some(spec.slowmode_secs);
            }
        }
        ChannelKind::Voice => {
            if existing.user_limit != spec.user_limit {
                update.user_limit = Some(spec.user_limit);
            }
        }
        ChannelKind::Category => {}
    }
    update
}

struct BaseRoles {
    registered: u64,
    unregistered: u64,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Registration flow for every guild the bot is in.
///
/// Holds configuration only; guild state always comes from the gateway.
pub struct RegistrationService {
    settings: RegistrationSettings,
    blueprint: SetupBlueprint,
}

impl RegistrationService {
    pub fn new(settings: RegistrationSettings, blueprint: SetupBlueprint) -> Self {
        let blueprint = blueprint.with_base_roles(&settings);
        Self {
            settings,
            blueprint,
        }
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    pub fn blueprint(&self) -> &SetupBlueprint {
        &self.blueprint
    }

    /// Build the nickname for an in-game name, enforcing Discord's limit.
    pub fn build_nickname(&self, name: &str) -> Result<String, RegistrationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        let nickname = format!("{}{}", self.settings.nickname_prefix, name)
            .trim()
            .to_string();
        if nickname.chars().count() > NICKNAME_MAX_CHARS {
            return Err(RegistrationError::NicknameTooLong {
                nickname,
                max: NICKNAME_MAX_CHARS,
            });
        }
        Ok(nickname)
    }

    fn not_configured(&self) -> RegistrationError {
        RegistrationError::NotConfigured {
            registered: self.settings.registered_role.clone(),
            unregistered: self.settings.unregistered_role.clone(),
        }
    }

    fn find_role<'a>(&self, roles: &'a [GuildRole], name: &str) -> Option<&'a GuildRole> {
        roles.iter().find(|r| r.name == name)
    }

    async fn base_roles<G: GuildGateway>(&self, guild: &G) -> Result<Option<BaseRoles>, GuildError> {
        let roles = guild.roles().await?;
        let registered = self.find_role(&roles, &self.settings.registered_role);
        let unregistered = self.find_role(&roles, &self.settings.unregistered_role);
        Ok(match (registered, unregistered) {
            (Some(r), Some(u)) => Some(BaseRoles {
                registered: r.id,
                unregistered: u.id,
            }),
            _ => None,
        })
    }

    fn is_registration_channel(&self, name: &str) -> bool {
        same_channel_name(ChannelKind::Text, name, &self.settings.channel_name)
    }

    /// Restrict a member that just joined.
    pub async fn handle_member_join<G: GuildGateway>(
        &self,
        guild: &G,
        user_id: u64,
    ) -> Result<JoinOutcome, RegistrationError> {
        if !self.settings.force_on_join {
            return Ok(JoinOutcome::Disabled);
        }

        let Some(base) = self.base_roles(guild).await? else {
            return Ok(JoinOutcome::NotConfigured);
        };

        let member = guild.member(user_id).await?;
        if member.has_role(base.registered) {
            return Ok(JoinOutcome::AlreadyRegistered);
        }
        if member.has_role(base.unregistered) {
            return Ok(JoinOutcome::AlreadyRestricted);
        }

        guild
            .add_member_role(user_id, base.unregistered, "Auto: force registration")
            .await?;

        let pinged = if self.settings.ping_on_join {
            self.ping_in_registration_channel(guild, user_id).await
        } else {
            false
        };

        Ok(JoinOutcome::Restricted { pinged })
    }

    /// Best effort; a failed ping never fails the join.
    async fn ping_in_registration_channel<G: GuildGateway>(&self, guild: &G, user_id: u64) -> bool {
        let channels = match guild.channels().await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::warn!(user_id, "Could not list channels for join ping: {}", e);
                return false;
            }
        };

        let Some(channel) = channels
            .iter()
            .find(|c| c.kind == ChannelKind::Text && self.is_registration_channel(&c.name))
        else {
            return false;
        };

        let message = OutgoingMessage::Text(format!(
            "<@{}> faça seu cadastro clicando em **Cadastrar**.",
            user_id
        ));
        match guild.send_message(channel.id, &message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id, channel_id = channel.id, "Join ping failed: {}", e);
                false
            }
        }
    }

    /// Register a member under their in-game name.
    ///
    /// The nickname is applied first; roles are only touched once the
    /// rename went through.
    pub async fn register<G: GuildGateway>(
        &self,
        guild: &G,
        user_id: u64,
        name: &str,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let nickname = self.build_nickname(name)?;

        let base = self
            .base_roles(guild)
            .await?
            .ok_or_else(|| self.not_configured())?;

        let member = guild.member(user_id).await?;

        guild
            .set_nickname(user_id, &nickname)
            .await
            .map_err(|e| match e {
                GuildError::Forbidden(msg) => RegistrationError::NicknameForbidden(msg),
                GuildError::Rejected(msg) => RegistrationError::NicknameRejected(msg),
                other => RegistrationError::Guild(other),
            })?;

        let roles_error = |e: GuildError| match e {
            GuildError::Forbidden(msg) => RegistrationError::RolesForbidden(msg),
            other => RegistrationError::Guild(other),
        };

        let removed_unregistered = member.has_role(base.unregistered);
        if removed_unregistered {
            guild
                .remove_member_role(user_id, base.unregistered, "Cadastro: remove unregistered")
                .await
                .map_err(roles_error)?;
        }

        let added_registered = !member.has_role(base.registered);
        if added_registered {
            guild
                .add_member_role(user_id, base.registered, "Cadastro: add registered")
                .await
                .map_err(roles_error)?;
        }

        Ok(RegistrationOutcome {
            nickname,
            previous_nickname: member.nickname,
            removed_unregistered,
            added_registered,
        })
    }

    /// Create whatever part of the blueprint is missing and resync drift.
    ///
    /// Not transactional: an error midway leaves what was already created.
    pub async fn setup<G: GuildGateway>(&self, guild: &G) -> Result<SetupReport, RegistrationError> {
        let mut report = SetupReport::default();

        // 1) Roles
        let mut roles = guild.roles().await?;
        for spec in &self.blueprint.roles {
            if spec.name.trim().is_empty() {
                continue;
            }
            match roles.iter().find(|r| r.name == spec.name) {
                Some(existing) if existing.matches(spec) => {}
                Some(existing) => {
                    guild.edit_role(existing.id, spec).await?;
                    report.roles_updated.push(spec.name.clone());
                }
                None => {
                    let created = guild.create_role(spec).await?;
                    roles.push(created);
                    report.roles_created.push(spec.name.clone());
                }
            }
        }

        let registered = self
            .find_role(&roles, &self.settings.registered_role)
            .map(|r| r.id);
        let unregistered = self
            .find_role(&roles, &self.settings.unregistered_role)
            .map(|r| r.id);
        let (Some(registered), Some(unregistered)) = (registered, unregistered) else {
            return Err(self.not_configured());
        };
        let everyone = guild.everyone_role_id();

        // 2) Categories, channels and overwrites
        let mut channels = guild.channels().await?;

        for category in &self.blueprint.categories {
            let existing_category = channels
                .iter()
                .find(|c| {
                    c.kind == ChannelKind::Category
                        && same_channel_name(ChannelKind::Category, &c.name, &category.name)
                })
                .map(|c| c.id);
            let category_id = match existing_category {
                Some(id) => id,
                None => {
                    let created = guild
                        .create_channel(&ChannelRequest::category(category.name.clone()))
                        .await?;
                    report.categories_created.push(category.name.clone());
                    let id = created.id;
                    channels.push(created);
                    id
                }
            };

            for spec in &category.channels {
                if spec.name.trim().is_empty() {
                    continue;
                }
                let is_registration =
                    spec.kind == ChannelKind::Text && self.is_registration_channel(&spec.name);
                let grants = channel_grants(everyone, registered, unregistered, is_registration);

                let existing = channels.iter().find(|c| {
                    c.kind == spec.kind
                        && c.parent_id == Some(category_id)
                        && same_channel_name(spec.kind, &c.name, &spec.name)
                });

                match existing {
                    Some(existing) => {
                        let mut synced = false;

                        let update = channel_update(existing, spec);
                        if !update.is_empty() {
                            guild.edit_channel(existing.id, &update).await?;
                            synced = true;
                        }

                        for grant in &grants {
                            if existing.overwrite_for(grant.role_id) != Some(grant) {
                                guild.set_permission(existing.id, grant).await?;
                                synced = true;
                            }
                        }

                        if synced {
                            report.channels_synced.push(spec.name.clone());
                        }
                    }
                    None => {
                        let request = ChannelRequest {
                            name: spec.name.clone(),
                            kind: spec.kind,
                            parent_id: Some(category_id),
                            topic: spec.topic.clone(),
                            slowmode_secs: spec.slowmode_secs,
                            user_limit: spec.user_limit,
                            overwrites: grants,
                        };
                        let created = guild.create_channel(&request).await?;
                        report.channels_created.push(spec.name.clone());
                        // The panel goes out together with its channel.
                        if is_registration {
                            report.panel_posted = self.post_panel(guild, created.id).await?;
                        }
                        channels.push(created);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Post the registration panel into a freshly created channel.
    ///
    /// A missing send permission is logged and reported as not posted.
    async fn post_panel<G: GuildGateway>(&self, guild: &G, channel_id: u64) -> Result<bool, GuildError> {
        match guild
            .send_message(channel_id, &OutgoingMessage::RegistrationPanel)
            .await
        {
            Ok(()) => Ok(true),
            Err(GuildError::Forbidden(msg)) => {
                tracing::warn!(channel_id, "Could not post registration panel: {}", msg);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Members still waiting to register, longest-waiting first.
    pub async fn pending_registrations<G: GuildGateway>(
        &self,
        guild: &G,
    ) -> Result<PendingReport, RegistrationError> {
        let roles = guild.roles().await?;
        let unregistered = self
            .find_role(&roles, &self.settings.unregistered_role)
            .ok_or_else(|| self.not_configured())?
            .id;

        let mut pending: Vec<PendingMember> = guild
            .members()
            .await?
            .into_iter()
            .filter(|m| m.has_role(unregistered))
            .map(|m| PendingMember {
                user_id: m.user_id,
                display_name: m.display_name,
                joined_at: m.joined_at,
            })
            .collect();

        // Unknown join dates sort last.
        pending.sort_by_key(|m| (m.joined_at.is_none(), m.joined_at));

        let total = pending.len();
        pending.truncate(PENDING_LIST_LIMIT);

        Ok(PendingReport {
            total,
            oldest: pending,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
