// Discord-specific registration glue: join events, the button/modal panel and
// the user-facing texts.

pub mod events;
pub mod messages;
pub mod panel;
