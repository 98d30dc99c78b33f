// Persistence port for auto-moderation data.
//
// The engine itself never reads this; it exists for the hosting layer to
// persist per-guild rule configuration across restarts and to keep a
// violation history for reporting commands.

use super::automod_engine::AutoModError;
use super::automod_models::{RuleCategory, RuleSet, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One row of the violation history. Append-only, reporting only.
#[derive(Debug, Clone)]
pub struct ViolationRecord {
    pub guild_id: u64,
    pub user_id: u64,
    pub category: RuleCategory,
    pub severity: Severity,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Trait for persisting rule configuration and violation history.
#[async_trait]
pub trait AutoModStore: Send + Sync {
    /// Load the saved rules for a guild. None means the guild has never
    /// saved a configuration and defaults apply.
    async fn load_rules(&self, guild_id: u64) -> Result<Option<RuleSet>, AutoModError>;

    /// Save the full rule configuration for a guild.
    async fn save_rules(&self, guild_id: u64, rules: &RuleSet) -> Result<(), AutoModError>;

    /// Append one violation to the history.
    async fn record_violation(&self, record: ViolationRecord) -> Result<(), AutoModError>;

    /// Most recent violations for a user in a guild, newest first.
    async fn recent_violations(
        &self,
        guild_id: u64,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<ViolationRecord>, AutoModError>;

    /// Delete all history rows for a user in a guild.
    async fn clear_violations(&self, guild_id: u64, user_id: u64) -> Result<(), AutoModError>;
}
