// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "registration/mod.rs"]
pub mod registration;
