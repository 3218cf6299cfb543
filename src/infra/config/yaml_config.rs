// YAML loader for the registration settings and the /setup blueprint.
//
// Example layout (every key optional):
//
// registration:
//   channel_name: "📋-registrar-se"
//   force_on_join: true
//   nickname_prefix: "Rec "
//   unregistered_role_name: "Não Registrado"
//   registered_role_name: "Registrado"
//   ping_on_join_in_channel: false
// roles:
//   - { name: "🛡️ Staff", color: "#F1C40F", hoist: true }
// categories:
//   - name: "Registro"
//     emoji: "📋"
//     channels:
//       - { name: "📋-registrar-se", type: text, topic: "..." }

use super::ConfigError;
use crate::core::registration::{
    same_channel_name, CategorySpec, ChannelKind, ChannelSpec, RegistrationSettings, RoleSpec,
    SetupBlueprint,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    registration: RegistrationSection,
    roles: Vec<RoleEntry>,
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistrationSection {
    channel_name: Option<String>,
    force_on_join: Option<bool>,
    nickname_prefix: Option<String>,
    unregistered_role_name: Option<String>,
    registered_role_name: Option<String>,
    ping_on_join_in_channel: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    name: String,
    #[serde(default = "default_role_color")]
    color: String,
    #[serde(default)]
    hoist: bool,
    #[serde(default)]
    mentionable: bool,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    name: String,
    #[serde(default = "default_category_emoji")]
    emoji: String,
    #[serde(default)]
    channels: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    name: String,
    #[serde(rename = "type", default = "default_channel_type")]
    kind: String,
    topic: Option<String>,
    #[serde(default)]
    slowmode: u16,
    #[serde(default)]
    user_limit: u32,
}

fn default_role_color() -> String {
    "#95A5A6".to_string()
}

fn default_category_emoji() -> String {
    "📁".to_string()
}

fn default_channel_type() -> String {
    "text".to_string()
}

/// Parse `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex_color(raw: &str) -> Result<u32, ConfigError> {
    let hex = raw.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return Err(ConfigError::InvalidColor(raw.to_string()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| ConfigError::InvalidColor(raw.to_string()))
}

fn parse_channel_kind(raw: &str) -> Result<ChannelKind, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "text" => Ok(ChannelKind::Text),
        "voice" => Ok(ChannelKind::Voice),
        _ => Err(ConfigError::InvalidChannelType(raw.to_string())),
    }
}

fn build_settings(section: RegistrationSection) -> RegistrationSettings {
    let defaults = RegistrationSettings::default();
    RegistrationSettings {
        channel_name: section.channel_name.unwrap_or(defaults.channel_name),
        force_on_join: section.force_on_join.unwrap_or(defaults.force_on_join),
        nickname_prefix: section.nickname_prefix.unwrap_or(defaults.nickname_prefix),
        unregistered_role: section
            .unregistered_role_name
            .unwrap_or(defaults.unregistered_role),
        registered_role: section
            .registered_role_name
            .unwrap_or(defaults.registered_role),
        ping_on_join: section
            .ping_on_join_in_channel
            .unwrap_or(defaults.ping_on_join),
    }
}

fn build_blueprint(
    roles: Vec<RoleEntry>,
    categories: Vec<CategoryEntry>,
    settings: &RegistrationSettings,
) -> Result<SetupBlueprint, ConfigError> {
    let roles = build_roles(roles)?;

    // Without a layout of its own the config still gets a registration channel.
    if categories.is_empty() {
        let mut blueprint = SetupBlueprint::default_for(settings);
        blueprint.roles = roles;
        return Ok(blueprint.with_base_roles(settings));
    }

    let categories = categories
        .into_iter()
        .map(|category| {
            let channels = category
                .channels
                .into_iter()
                .map(|ch| {
                    Ok(ChannelSpec {
                        name: ch.name.trim().to_string(),
                        kind: parse_channel_kind(&ch.kind)?,
                        topic: ch.topic,
                        slowmode_secs: ch.slowmode,
                        user_limit: ch.user_limit,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;

            Ok(CategorySpec {
                name: format!("{} {}", category.emoji.trim(), category.name.trim())
                    .trim()
                    .to_string(),
                channels,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(SetupBlueprint { roles, categories }.with_base_roles(settings))
}

fn build_roles(entries: Vec<RoleEntry>) -> Result<Vec<RoleSpec>, ConfigError> {
    entries
        .into_iter()
        .map(|r| {
            Ok(RoleSpec {
                name: r.name.trim().to_string(),
                color: parse_hex_color(&r.color)?,
                hoist: r.hoist,
                mentionable: r.mentionable,
            })
        })
        .collect()
}

fn parse_config(
    raw: &str,
    path: &str,
) -> Result<(RegistrationSettings, SetupBlueprint), ConfigError> {
    let file: ConfigFile = serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
        path: path.to_string(),
        source,
    })?;

    let settings = build_settings(file.registration);
    let blueprint = build_blueprint(file.roles, file.categories, &settings)?;
    Ok((settings, blueprint))
}

/// Whether `/setup` would create the channel members register in.
fn has_registration_channel(settings: &RegistrationSettings, blueprint: &SetupBlueprint) -> bool {
    blueprint
        .categories
        .iter()
        .flat_map(|c| c.channels.iter())
        .any(|ch| {
            ch.kind == ChannelKind::Text
                && same_channel_name(ChannelKind::Text, &ch.name, &settings.channel_name)
        })
}

/// Load the registration config, falling back to built-in defaults when the
/// file does not exist.
pub fn load_registration_config(
    path: &Path,
) -> Result<(RegistrationSettings, SetupBlueprint), ConfigError> {
    let path_display = path.display().to_string();

    if !path.exists() {
        tracing::info!(path = %path_display, "No registration config found, using defaults");
        let settings = RegistrationSettings::default();
        let blueprint = SetupBlueprint::default_for(&settings);
        return Ok((settings, blueprint));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path_display.clone(),
        source,
    })?;
    let (settings, blueprint) = parse_config(&raw, &path_display)?;

    if !has_registration_channel(&settings, &blueprint) {
        tracing::warn!(
            path = %path_display,
            channel = %settings.channel_name,
            "No configured category contains the registration channel; /setup will not create it"
        );
    }

    tracing::info!(
        path = %path_display,
        roles = blueprint.roles.len(),
        categories = blueprint.categories.len(),
        "Loaded registration config"
    );
    Ok((settings, blueprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r##"
registration:
  channel_name: "📋-registrar-se"
  nickname_prefix: "[DZ] "
  unregistered_role_name: "⛔ Não Registrado"
  registered_role_name: "✅ Registrado"
  ping_on_join_in_channel: true
roles:
  - name: "🛡️ Staff"
    color: "#F1C40F"
    hoist: true
categories:
  - name: "Registro"
    emoji: "📋"
    channels:
      - name: "📋-registrar-se"
        type: text
        topic: "Cadastre-se aqui"
  - name: "Voz"
    emoji: "🔊"
    channels:
      - name: "Squad 1"
        type: voice
        user_limit: 4
      - name: "regras"
        slowmode: 10
"##;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#2ECC71").unwrap(), 0x2ECC71);
        assert_eq!(parse_hex_color(" e74c3c ").unwrap(), 0xE74C3C);
        assert!(matches!(
            parse_hex_color("#FFF"),
            Err(ConfigError::InvalidColor(_))
        ));
        assert!(matches!(
            parse_hex_color("#GGGGGG"),
            Err(ConfigError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_parse_full_config() {
        let (settings, blueprint) = parse_config(SAMPLE, "config.yaml").unwrap();

        assert_eq!(settings.nickname_prefix, "[DZ] ");
        assert_eq!(settings.unregistered_role, "⛔ Não Registrado");
        assert!(settings.force_on_join);
        assert!(settings.ping_on_join);

        let role_names: Vec<&str> = blueprint.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            role_names,
            vec!["🛡️ Staff", "✅ Registrado", "⛔ Não Registrado"]
        );
        assert_eq!(blueprint.roles[0].color, 0xF1C40F);

        assert_eq!(blueprint.categories[0].name, "📋 Registro");
        let voice = &blueprint.categories[1];
        assert_eq!(voice.channels[0].kind, ChannelKind::Voice);
        assert_eq!(voice.channels[0].user_limit, 4);
        assert_eq!(voice.channels[1].kind, ChannelKind::Text);
        assert_eq!(voice.channels[1].slowmode_secs, 10);
    }

    #[test]
    fn test_config_without_categories_uses_default_layout() {
        let (settings, blueprint) =
            parse_config("registration:\n  force_on_join: false\n", "config.yaml").unwrap();

        assert!(!settings.force_on_join);
        assert_eq!(settings.nickname_prefix, "Rec ");
        assert_eq!(blueprint, SetupBlueprint::default_for(&settings));
    }

    #[test]
    fn test_invalid_channel_type_is_rejected() {
        let raw = "categories:\n  - name: X\n    channels:\n      - { name: a, type: forum }\n";
        let err = parse_config(raw, "config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChannelType(_)));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let err = parse_config("roles: [", "bad.yaml").unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_registration_channel_lookup_uses_discord_slug() {
        let raw = r#"
registration:
  channel_name: "Registrar Se"
categories:
  - name: "Registro"
    channels:
      - { name: "registrar-se", type: text }
"#;
        let (settings, blueprint) = parse_config(raw, "config.yaml").unwrap();
        assert!(has_registration_channel(&settings, &blueprint));

        let voice_only = SetupBlueprint {
            roles: Vec::new(),
            categories: vec![CategorySpec {
                name: "Voz".into(),
                channels: vec![ChannelSpec::voice("Registrar Se", 0)],
            }],
        };
        assert!(!has_registration_channel(&settings, &voice_only));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let (settings, blueprint) = load_registration_config(&path).unwrap();

        assert_eq!(settings, RegistrationSettings::default());
        assert_eq!(blueprint, SetupBlueprint::default_for(&settings));
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let (settings, blueprint) = load_registration_config(tmp.path()).unwrap();

        assert_eq!(settings.registered_role, "✅ Registrado");
        assert_eq!(blueprint.categories.len(), 2);
    }
}
