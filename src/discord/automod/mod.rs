// Discord-specific auto-moderation glue.

pub mod bridge;
pub mod handler;
