// Core auto-moderation module - rule evaluation business logic.

pub mod automod_engine;
pub mod automod_models;
pub mod automod_store;
pub mod classifiers;

pub use automod_engine::*;
pub use automod_models::*;
pub use automod_store::*;
