// Discord commands module.
// Each feature gets its own command file.

pub mod registration;

pub mod setup;

// Bot presence management
pub mod presence;
