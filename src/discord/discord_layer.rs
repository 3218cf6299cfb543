// Discord layer - commands and event handlers.

use crate::core::registration::RegistrationService;
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "registration/mod.rs"]
pub mod registration;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared across all commands and event handlers.
pub struct Data {
    pub registration: Arc<RegistrationService>,
}
