// Startup configuration: process environment plus the optional YAML blueprint.

pub mod env_config;
pub mod yaml_config;

pub use env_config::BotConfig;
pub use yaml_config::load_registration_config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN is not set. Create a .env file with your bot token.")]
    MissingToken,
    #[error("invalid {var}: `{value}` is not a guild id")]
    InvalidGuildId { var: &'static str, value: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid color `{0}`, use #RRGGBB")]
    InvalidColor(String),
    #[error("invalid channel type `{0}`, use text or voice")]
    InvalidChannelType(String),
}
