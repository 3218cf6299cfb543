use super::ConfigError;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Settings read from the process environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub token: String,
    /// YAML file with registration settings and the setup blueprint
    pub config_path: PathBuf,
    /// Register commands in this guild only, for instant updates during development
    pub dev_guild_id: Option<u64>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("DISCORD_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let config_path = lookup("REGISTRATION_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into();

        let dev_guild_id = match lookup("DISCORD_DEV_GUILD_ID") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(raw.trim().parse::<u64>().map_err(|_| {
                    ConfigError::InvalidGuildId {
                        var: "DISCORD_DEV_GUILD_ID",
                        value: raw.clone(),
                    }
                })?)
            }
            _ => None,
        };

        Ok(Self {
            token,
            config_path,
            dev_guild_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = BotConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_blank_token_is_fatal() {
        let err = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", " abc ")])).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.config_path, PathBuf::from("config.yaml"));
        assert_eq!(config.dev_guild_id, None);
    }

    #[test]
    fn test_optional_variables() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("REGISTRATION_CONFIG", "/etc/bot/server.yaml"),
            ("DISCORD_DEV_GUILD_ID", "1432001978447167611"),
        ]))
        .unwrap();
        assert_eq!(config.config_path, PathBuf::from("/etc/bot/server.yaml"));
        assert_eq!(config.dev_guild_id, Some(1432001978447167611));
    }

    #[test]
    fn test_invalid_dev_guild_id() {
        let err = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_DEV_GUILD_ID", "not-a-number"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGuildId { .. }));
    }
}
