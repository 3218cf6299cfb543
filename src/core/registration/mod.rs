// Core registration module - contains the member registration business logic.
// Discord is reached only through the GuildGateway port.

pub mod registration_models;
pub mod registration_service;

pub use registration_models::*;
pub use registration_service::*;
