// Per-guild engine registry and the message-event entry point.
//
// Translates serenity messages into engine snapshots and engine outcomes
// into history rows. Engines are created lazily per guild with whatever
// rules the store has for that guild.

use crate::core::automod::{
    AutoModEngine, AutoModError, AutoModStore, MessageSnapshot, RuleCategory, RuleSet, RuleUpdate,
    ViolationRecord,
};
use crate::discord::automod::bridge::SerenityBridge;
use crate::discord::Error;
use crate::infra::automod::InMemoryMessageArchive;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type GuildEngine =
    AutoModEngine<Arc<InMemoryMessageArchive>, SerenityBridge, SerenityBridge>;

/// One guild's engine plus the host-owned recent-message archive feeding
/// its spam rule.
#[derive(Clone)]
pub struct GuildAutoMod {
    pub engine: Arc<GuildEngine>,
    pub archive: Arc<InMemoryMessageArchive>,
}

pub struct AutoModManager<S: AutoModStore> {
    store: S,
    engines: DashMap<u64, GuildAutoMod>,
    /// Moderator log channel applied to every guild engine. None disables
    /// moderator notifications.
    log_channel: Option<u64>,
}

impl<S: AutoModStore> AutoModManager<S> {
    pub fn new(store: S, log_channel: Option<u64>) -> Self {
        Self {
            store,
            engines: DashMap::new(),
            log_channel,
        }
    }

    /// Get or lazily create the guild's engine, loading persisted rules on
    /// first use.
    async fn guild_entry(
        &self,
        guild_id: u64,
        http: &Arc<serenity::Http>,
    ) -> Result<GuildAutoMod, AutoModError> {
        if let Some(entry) = self.engines.get(&guild_id) {
            return Ok(entry.clone());
        }

        let rules = self
            .store
            .load_rules(guild_id)
            .await?
            .unwrap_or_else(RuleSet::default);

        let archive = Arc::new(InMemoryMessageArchive::new());
        let bridge = SerenityBridge::new(Arc::clone(http), guild_id);
        let engine = Arc::new(AutoModEngine::new(
            rules,
            self.log_channel,
            Arc::clone(&archive),
            bridge.clone(),
            bridge,
        ));

        // Another event may have built an entry while we were loading;
        // whichever landed first wins.
        let entry = self
            .engines
            .entry(guild_id)
            .or_insert(GuildAutoMod { engine, archive })
            .clone();
        Ok(entry)
    }

    /// Run auto-moderation over one incoming message.
    ///
    /// Returns `true` if the message produced at least one violation.
    pub async fn handle_message(
        &self,
        ctx: &serenity::Context,
        msg: &serenity::Message,
    ) -> Result<bool, Error> {
        // Skip bots and DMs before touching any state.
        if msg.author.bot {
            return Ok(false);
        }
        let Some(guild_id) = msg.guild_id else {
            return Ok(false);
        };
        let guild_id = guild_id.get();

        let entry = self
            .guild_entry(guild_id, &ctx.http)
            .await
            .map_err(|e| Error::from(e.to_string()))?;

        let snapshot = snapshot_from(msg);
        let outcome = entry
            .engine
            .process_message(&snapshot)
            .await
            .map_err(|e| Error::from(e.to_string()))?;

        // Record after evaluation so the spam window never counts the
        // message under evaluation.
        entry
            .archive
            .record(snapshot.channel_id, snapshot.author_id, snapshot.timestamp);

        if let Some(outcome) = &outcome {
            for violation in &outcome.violations {
                let record = ViolationRecord {
                    guild_id,
                    user_id: snapshot.author_id,
                    category: violation.category,
                    severity: violation.severity,
                    reason: violation.reason.clone(),
                    created_at: snapshot.timestamp,
                };
                if let Err(e) = self.store.record_violation(record).await {
                    tracing::warn!("Failed to record violation history: {}", e);
                }
            }
        }

        Ok(outcome.is_some())
    }

    /// Current rule configuration for a guild.
    pub async fn rules(
        &self,
        guild_id: u64,
        http: &Arc<serenity::Http>,
    ) -> Result<RuleSet, AutoModError> {
        let entry = self.guild_entry(guild_id, http).await?;
        Ok(entry.engine.rules().await)
    }

    /// Apply a partial rule update and persist the result.
    pub async fn update_rule(
        &self,
        guild_id: u64,
        http: &Arc<serenity::Http>,
        category: RuleCategory,
        update: &RuleUpdate,
    ) -> Result<RuleSet, AutoModError> {
        let entry = self.guild_entry(guild_id, http).await?;
        entry.engine.update_rule(category, update).await;
        let rules = entry.engine.rules().await;
        self.store.save_rules(guild_id, &rules).await?;
        Ok(rules)
    }

    /// Ledger count plus recent persisted history for one user.
    pub async fn user_violations(
        &self,
        guild_id: u64,
        http: &Arc<serenity::Http>,
        user_id: u64,
        history_limit: u32,
    ) -> Result<(u32, Vec<ViolationRecord>), AutoModError> {
        let entry = self.guild_entry(guild_id, http).await?;
        let count = entry.engine.user_violations(user_id);
        let history = self
            .store
            .recent_violations(guild_id, user_id, history_limit)
            .await?;
        Ok((count, history))
    }

    /// Admin reset: clears both the ledger entry and the persisted history.
    pub async fn reset_user(
        &self,
        guild_id: u64,
        http: &Arc<serenity::Http>,
        user_id: u64,
    ) -> Result<(), AutoModError> {
        let entry = self.guild_entry(guild_id, http).await?;
        entry.engine.reset_user_violations(user_id);
        self.store.clear_violations(guild_id, user_id).await
    }
}

/// Build the engine's immutable message view from a serenity message.
fn snapshot_from(msg: &serenity::Message) -> MessageSnapshot {
    let timestamp = chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
        .unwrap_or_else(chrono::Utc::now);

    MessageSnapshot {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        timestamp,
        user_mentions: msg.mentions.len() as u32,
        role_mentions: msg.mention_roles.len() as u32,
    }
}
