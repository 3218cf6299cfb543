// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "guild/mod.rs"]
pub mod guild;

#[path = "config/mod.rs"]
pub mod config;
