// Registration domain models.
//
// These are pure domain types with no Discord dependencies. Ids are plain
// u64 snowflakes; the Discord layer converts them to serenity ids.

use chrono::{DateTime, Utc};

/// Discord refuses nicknames longer than this (counted in characters).
pub const NICKNAME_MAX_CHARS: usize = 32;

/// Custom id of the "Cadastrar" button posted by `/setup`.
pub const REGISTER_BUTTON_ID: &str = "register_button";

/// Custom id of the modal opened by the register button.
pub const REGISTER_MODAL_ID: &str = "register_modal";

/// Custom id of the in-game name field inside the register modal.
pub const GAME_NAME_INPUT_ID: &str = "game_name";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// How the registration flow behaves in every guild the bot runs in.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationSettings {
    /// Name of the text channel new members register in
    pub channel_name: String,
    /// Grant the unregistered role automatically on join
    pub force_on_join: bool,
    /// Prepended to the in-game name to build the nickname
    pub nickname_prefix: String,
    pub unregistered_role: String,
    pub registered_role: String,
    /// Mention new members in the registration channel
    pub ping_on_join: bool,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            channel_name: "📋-registrar-se".to_string(),
            force_on_join: true,
            nickname_prefix: "Rec ".to_string(),
            unregistered_role: "Não Registrado".to_string(),
            registered_role: "Registrado".to_string(),
            ping_on_join: false,
        }
    }
}

/// A role `/setup` makes sure exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    /// 0xRRGGBB
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Category,
    Text,
    Voice,
}

/// A channel `/setup` makes sure exists inside its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub kind: ChannelKind,
    pub topic: Option<String>,
    pub slowmode_secs: u16,
    pub user_limit: u32,
}

impl ChannelSpec {
    pub fn text(name: impl Into<String>, topic: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Text,
            topic: topic.map(str::to_string),
            slowmode_secs: 0,
            user_limit: 0,
        }
    }

    pub fn voice(name: impl Into<String>, user_limit: u32) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Voice,
            topic: None,
            slowmode_secs: 0,
            user_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    /// Full category name, emoji included
    pub name: String,
    pub channels: Vec<ChannelSpec>,
}

/// Everything `/setup` scaffolds in a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupBlueprint {
    pub roles: Vec<RoleSpec>,
    pub categories: Vec<CategorySpec>,
}

impl SetupBlueprint {
    /// The layout used when no config file provides one.
    pub fn default_for(settings: &RegistrationSettings) -> Self {
        Self {
            roles: Vec::new(),
            categories: vec![
                CategorySpec {
                    name: "📋 Registro".to_string(),
                    channels: vec![ChannelSpec::text(
                        settings.channel_name.clone(),
                        Some("Clique em Cadastrar para liberar o servidor."),
                    )],
                },
                CategorySpec {
                    name: "💬 Comunidade".to_string(),
                    channels: vec![
                        ChannelSpec::text("💬-chat-geral", None),
                        ChannelSpec::text("📢-avisos", Some("Avisos da staff.")),
                        ChannelSpec::voice("🔊 Geral", 0),
                    ],
                },
            ],
        }
        .with_base_roles(settings)
    }

    /// Make sure the registered/unregistered roles are part of the blueprint,
    /// even when the config forgot to list them.
    pub fn with_base_roles(mut self, settings: &RegistrationSettings) -> Self {
        let base = [
            (&settings.registered_role, 0x2ECC71),
            (&settings.unregistered_role, 0xE74C3C),
        ];
        for (name, color) in base {
            if !self.roles.iter().any(|r| &r.name == name) {
                self.roles.push(RoleSpec {
                    name: name.clone(),
                    color,
                    hoist: true,
                    mentionable: false,
                });
            }
        }
        self
    }
}

// ============================================================================
// LIVE GUILD STATE (as reported by the gateway)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: u64,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
}

impl GuildRole {
    pub fn matches(&self, spec: &RoleSpec) -> bool {
        self.color == spec.color && self.hoist == spec.hoist && self.mentionable == spec.mentionable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuildMember {
    pub user_id: u64,
    pub display_name: String,
    pub nickname: Option<String>,
    pub role_ids: Vec<u64>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl GuildMember {
    pub fn has_role(&self, role_id: u64) -> bool {
        self.role_ids.contains(&role_id)
    }
}

/// The subset of channel permissions the registration flow manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessSet {
    pub view: bool,
    pub send: bool,
    pub read_history: bool,
}

impl AccessSet {
    pub const NONE: Self = Self {
        view: false,
        send: false,
        read_history: false,
    };
    pub const VIEW: Self = Self {
        view: true,
        send: false,
        read_history: false,
    };
    pub const SEND: Self = Self {
        view: false,
        send: true,
        read_history: false,
    };
    pub const READ_ONLY: Self = Self {
        view: true,
        send: false,
        read_history: true,
    };
    pub const FULL: Self = Self {
        view: true,
        send: true,
        read_history: true,
    };
}

/// A role permission overwrite on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub role_id: u64,
    pub allow: AccessSet,
    pub deny: AccessSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuildChannel {
    pub id: u64,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<u64>,
    pub topic: Option<String>,
    pub slowmode_secs: u16,
    pub user_limit: u32,
    pub overwrites: Vec<PermissionGrant>,
}

impl GuildChannel {
    pub fn overwrite_for(&self, role_id: u64) -> Option<&PermissionGrant> {
        self.overwrites.iter().find(|o| o.role_id == role_id)
    }
}

// ============================================================================
// GATEWAY REQUESTS
// ============================================================================

/// Everything needed to create a channel or category.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRequest {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<u64>,
    pub topic: Option<String>,
    pub slowmode_secs: u16,
    pub user_limit: u32,
    pub overwrites: Vec<PermissionGrant>,
}

impl ChannelRequest {
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Category,
            parent_id: None,
            topic: None,
            slowmode_secs: 0,
            user_limit: 0,
            overwrites: Vec::new(),
        }
    }
}

/// Property changes for an existing channel. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelUpdate {
    pub topic: Option<String>,
    pub slowmode_secs: Option<u16>,
    pub user_limit: Option<u32>,
}

impl ChannelUpdate {
    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.slowmode_secs.is_none() && self.user_limit.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingMessage {
    Text(String),
    /// The registration call to action with the "Cadastrar" button
    RegistrationPanel,
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// `force_on_join` is off
    Disabled,
    /// Base roles are missing, `/setup` has not run yet
    NotConfigured,
    AlreadyRegistered,
    AlreadyRestricted,
    Restricted { pinged: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub nickname: String,
    pub previous_nickname: Option<String>,
    pub removed_unregistered: bool,
    pub added_registered: bool,
}

/// What a `/setup` run changed. Empty when the guild was already in shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupReport {
    pub roles_created: Vec<String>,
    pub roles_updated: Vec<String>,
    pub categories_created: Vec<String>,
    pub channels_created: Vec<String>,
    pub channels_synced: Vec<String>,
    pub panel_posted: bool,
}

impl SetupReport {
    pub fn is_noop(&self) -> bool {
        self.roles_created.is_empty()
            && self.roles_updated.is_empty()
            && self.categories_created.is_empty()
            && self.channels_created.is_empty()
            && self.channels_synced.is_empty()
            && !self.panel_posted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMember {
    pub user_id: u64,
    pub display_name: String,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Members still holding the unregistered role.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReport {
    pub total: usize,
    /// Longest-waiting first
    pub oldest: Vec<PendingMember>,
}
