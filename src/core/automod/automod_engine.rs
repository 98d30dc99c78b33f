// Auto-moderation engine - core business logic for rule evaluation.
//
// The engine runs every enabled classifier over a message snapshot,
// aggregates the violations, dispatches each violation's configured action
// through injected capability traits, and keeps an in-memory per-user
// violation ledger for reporting.
//
// NO Discord dependencies here - the Discord layer implements the ports.

use super::automod_models::{
    MessageSnapshot, ModerationOutcome, RuleCategory, RuleSet, RuleUpdate, Violation,
};
use super::classifiers;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Fixed duration for the timeout action.
pub const TIMEOUT_DURATION: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AutoModError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Message archive error: {0}")]
    Archive(String),

    #[error("Unknown rule category: {0}")]
    UnknownRule(String),
}

/// Failure of a single external moderation or notification call.
///
/// These never propagate out of dispatch; they only exist so fakes can
/// simulate a failing platform.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ActuationError(pub String);

// ============================================================================
// CAPABILITY TRAITS (PORTS)
// ============================================================================

/// Read access to the host's recent-message cache, used by the spam rule.
///
/// The engine does not own this cache; staleness and eviction are the
/// host's concern. At evaluation time the archive holds only messages seen
/// before the one being checked.
#[async_trait]
pub trait MessageArchive: Send + Sync {
    /// Count messages from `author_id` in `channel_id` with a timestamp at
    /// or after `since`.
    async fn count_recent(
        &self,
        channel_id: u64,
        author_id: u64,
        since: DateTime<Utc>,
    ) -> Result<u32, AutoModError>;
}

#[async_trait]
impl<T: MessageArchive> MessageArchive for Arc<T> {
    async fn count_recent(
        &self,
        channel_id: u64,
        author_id: u64,
        since: DateTime<Utc>,
    ) -> Result<u32, AutoModError> {
        (**self).count_recent(channel_id, author_id, since).await
    }
}

/// Real moderation effects. Implementations must not panic on failure.
#[async_trait]
pub trait ModerationActuator: Send + Sync {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ActuationError>;

    async fn timeout_member(
        &self,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), ActuationError>;

    async fn kick_member(&self, user_id: u64, reason: &str) -> Result<(), ActuationError>;
}

#[async_trait]
impl<T: ModerationActuator> ModerationActuator for Arc<T> {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ActuationError> {
        (**self).delete_message(channel_id, message_id).await
    }

    async fn timeout_member(
        &self,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), ActuationError> {
        (**self).timeout_member(user_id, duration, reason).await
    }

    async fn kick_member(&self, user_id: u64, reason: &str) -> Result<(), ActuationError> {
        (**self).kick_member(user_id, reason).await
    }
}

/// Message delivery to users and channels, best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_private_message(&self, user_id: u64, content: &str)
        -> Result<(), ActuationError>;

    async fn send_channel_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<(), ActuationError>;
}

#[async_trait]
impl<T: Notifier> Notifier for Arc<T> {
    async fn send_private_message(
        &self,
        user_id: u64,
        content: &str,
    ) -> Result<(), ActuationError> {
        (**self).send_private_message(user_id, content).await
    }

    async fn send_channel_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<(), ActuationError> {
        (**self).send_channel_message(channel_id, content).await
    }
}

// ============================================================================
// CORE ENGINE
// ============================================================================

/// Rule-evaluation engine for one tenant (one guild).
///
/// Holds its own configuration; multi-tenancy is one engine per guild,
/// managed by the hosting layer.
pub struct AutoModEngine<M, A, N>
where
    M: MessageArchive,
    A: ModerationActuator,
    N: Notifier,
{
    rules: RwLock<RuleSet>,
    /// Moderator log destination. None silently disables the log path.
    log_channel: Option<u64>,
    archive: M,
    actuator: A,
    notifier: N,
    /// user_id -> count of messages that produced at least one violation.
    /// Reporting only, reset by explicit admin action.
    ledger: DashMap<u64, u32>,
}

impl<M, A, N> AutoModEngine<M, A, N>
where
    M: MessageArchive,
    A: ModerationActuator,
    N: Notifier,
{
    pub fn new(rules: RuleSet, log_channel: Option<u64>, archive: M, actuator: A, notifier: N) -> Self {
        Self {
            rules: RwLock::new(rules),
            log_channel,
            archive,
            actuator,
            notifier,
            ledger: DashMap::new(),
        }
    }

    /// Run all enabled classifiers over one message and act on the result.
    ///
    /// Returns `None` when no rule fired; the message is otherwise left
    /// alone. Action and notification failures are logged and swallowed;
    /// only an archive failure propagates, aborting this message's pass.
    pub async fn process_message(
        &self,
        msg: &MessageSnapshot,
    ) -> Result<Option<ModerationOutcome>, AutoModError> {
        // Bot accounts are exempt from every rule.
        if msg.author_is_bot {
            return Ok(None);
        }

        let rules = self.rules.read().await.clone();
        let mut violations = Vec::new();

        if rules.spam.enabled {
            let since = msg.timestamp
                - ChronoDuration::milliseconds(rules.spam.timeframe_ms.min(i64::MAX as u64) as i64);
            let recent = self
                .archive
                .count_recent(msg.channel_id, msg.author_id, since)
                .await?;
            if let Some(v) = classifiers::check_spam(recent, &rules.spam) {
                violations.push(v);
            }
        }
        if rules.profanity.enabled {
            if let Some(v) = classifiers::check_profanity(msg, &rules.profanity) {
                violations.push(v);
            }
        }
        if rules.caps.enabled {
            if let Some(v) = classifiers::check_caps(msg, &rules.caps) {
                violations.push(v);
            }
        }
        if rules.links.enabled {
            if let Some(v) = classifiers::check_links(msg, &rules.links) {
                violations.push(v);
            }
        }
        if rules.mentions.enabled {
            if let Some(v) = classifiers::check_mentions(msg, &rules.mentions) {
                violations.push(v);
            }
        }
        if rules.invites.enabled {
            if let Some(v) = classifiers::check_invites(msg, &rules.invites) {
                violations.push(v);
            }
        }

        if violations.is_empty() {
            return Ok(None);
        }

        let highest_severity = classifiers::highest_severity(&violations);

        tracing::warn!(
            author_id = msg.author_id,
            channel_id = msg.channel_id,
            violations = violations.len(),
            severity = %highest_severity,
            "Auto-mod violation detected"
        );

        // One action per violation, each independent and best-effort.
        for violation in &violations {
            self.dispatch(msg, violation).await;
        }

        // One ledger increment per offending message, not per violation.
        self.ledger
            .entry(msg.author_id)
            .and_modify(|count| *count += 1)
            .or_insert(1);

        self.notify_moderators(msg, &violations, highest_severity)
            .await;

        Ok(Some(ModerationOutcome {
            violations,
            highest_severity,
        }))
    }

    /// Execute one violation's configured action.
    async fn dispatch(&self, msg: &MessageSnapshot, violation: &Violation) {
        use super::automod_models::RuleAction;

        match violation.action {
            RuleAction::Delete => {
                self.delete_message(msg).await;
            }
            RuleAction::Warn => {
                self.warn_user(msg, violation).await;
            }
            RuleAction::DeleteAndWarn => {
                self.delete_message(msg).await;
                self.warn_user(msg, violation).await;
            }
            RuleAction::Timeout => {
                let reason = format!("Auto-mod: {}", violation.reason);
                if let Err(e) = self
                    .actuator
                    .timeout_member(msg.author_id, TIMEOUT_DURATION, &reason)
                    .await
                {
                    tracing::error!("Failed to timeout user {}: {}", msg.author_id, e);
                }
            }
            RuleAction::Kick => {
                let reason = format!("Auto-mod: {}", violation.reason);
                if let Err(e) = self.actuator.kick_member(msg.author_id, &reason).await {
                    tracing::error!("Failed to kick user {}: {}", msg.author_id, e);
                }
            }
        }
    }

    async fn delete_message(&self, msg: &MessageSnapshot) {
        if let Err(e) = self
            .actuator
            .delete_message(msg.channel_id, msg.message_id)
            .await
        {
            tracing::warn!("Failed to delete message {}: {}", msg.message_id, e);
        }
    }

    /// Warn the author: DM first, in-channel mention as fallback.
    async fn warn_user(&self, msg: &MessageSnapshot, violation: &Violation) {
        let dm = format!(
            "Your message was flagged by our automatic moderation system.\n\
             Rule: {}\nReason: {}\nChannel: <#{}>\n\
             Please review the server rules to avoid future violations.",
            violation.category, violation.reason, msg.channel_id
        );

        if self
            .notifier
            .send_private_message(msg.author_id, &dm)
            .await
            .is_ok()
        {
            return;
        }

        // DMs disabled or blocked, notify in the channel instead.
        let notice = format!(
            "<@{}>, your message was flagged by our automatic moderation system ({}).",
            msg.author_id, violation.category
        );
        if let Err(e) = self
            .notifier
            .send_channel_message(msg.channel_id, &notice)
            .await
        {
            tracing::warn!("Failed to send fallback warning: {}", e);
        }
    }

    /// One summary per offending message to the configured log channel.
    async fn notify_moderators(
        &self,
        msg: &MessageSnapshot,
        violations: &[Violation],
        highest_severity: super::automod_models::Severity,
    ) {
        let Some(log_channel) = self.log_channel else {
            return;
        };

        let reasons: Vec<&str> = violations.iter().map(|v| v.reason.as_str()).collect();
        let summary = format!(
            "Auto-moderation: <@{}> in <#{}> | {} violation(s), severity {} | {}",
            msg.author_id,
            msg.channel_id,
            violations.len(),
            highest_severity,
            reasons.join("; ")
        );

        if let Err(e) = self
            .notifier
            .send_channel_message(log_channel, &summary)
            .await
        {
            tracing::warn!("Failed to send moderator log: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Merge a partial update into one category's configuration.
    pub async fn update_rule(&self, category: RuleCategory, update: &RuleUpdate) {
        self.rules.write().await.apply(category, update);
    }

    /// Same as [`update_rule`](Self::update_rule), but parses the category
    /// name first. An unknown name is a typed error and leaves every
    /// category untouched.
    pub async fn update_rule_by_name(
        &self,
        name: &str,
        update: &RuleUpdate,
    ) -> Result<(), AutoModError> {
        let category = RuleCategory::from_str(name)?;
        self.update_rule(category, update).await;
        Ok(())
    }

    /// Snapshot of the current configuration.
    pub async fn rules(&self) -> RuleSet {
        self.rules.read().await.clone()
    }

    /// Replace the whole configuration, e.g. when loading persisted rules.
    pub async fn replace_rules(&self, rules: RuleSet) {
        *self.rules.write().await = rules;
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    /// Number of this user's messages that produced at least one violation.
    pub fn user_violations(&self, user_id: u64) -> u32 {
        self.ledger.get(&user_id).map(|count| *count).unwrap_or(0)
    }

    /// Admin reset of a user's ledger entry.
    pub fn reset_user_violations(&self, user_id: u64) {
        self.ledger.remove(&user_id);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::automod::automod_models::{RuleAction, Severity};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Archive fake returning a fixed window count.
    struct FixedArchive {
        count: u32,
    }

    #[async_trait]
    impl MessageArchive for FixedArchive {
        async fn count_recent(
            &self,
            _channel_id: u64,
            _author_id: u64,
            _since: DateTime<Utc>,
        ) -> Result<u32, AutoModError> {
            Ok(self.count)
        }
    }

    /// Actuator fake that records calls and optionally fails deletes.
    #[derive(Default)]
    struct RecordingActuator {
        deletes: AtomicU32,
        timeouts: AtomicU32,
        kicks: AtomicU32,
        fail_deletes_after_first: bool,
    }

    #[async_trait]
    impl ModerationActuator for RecordingActuator {
        async fn delete_message(
            &self,
            _channel_id: u64,
            _message_id: u64,
        ) -> Result<(), ActuationError> {
            let attempts = self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes_after_first && attempts > 0 {
                return Err(ActuationError("Unknown Message".to_string()));
            }
            Ok(())
        }

        async fn timeout_member(
            &self,
            _user_id: u64,
            _duration: Duration,
            _reason: &str,
        ) -> Result<(), ActuationError> {
            self.timeouts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn kick_member(&self, _user_id: u64, _reason: &str) -> Result<(), ActuationError> {
            self.kicks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Notifier fake capturing sent content; DMs can be set to fail.
    #[derive(Default)]
    struct RecordingNotifier {
        dms_fail: bool,
        dms: Mutex<Vec<(u64, String)>>,
        channel_messages: Mutex<Vec<(u64, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_private_message(
            &self,
            user_id: u64,
            content: &str,
        ) -> Result<(), ActuationError> {
            if self.dms_fail {
                return Err(ActuationError("Cannot send messages to this user".to_string()));
            }
            self.dms
                .lock()
                .unwrap()
                .push((user_id, content.to_string()));
            Ok(())
        }

        async fn send_channel_message(
            &self,
            channel_id: u64,
            content: &str,
        ) -> Result<(), ActuationError> {
            self.channel_messages
                .lock()
                .unwrap()
                .push((channel_id, content.to_string()));
            Ok(())
        }
    }

    type TestEngine =
        AutoModEngine<FixedArchive, Arc<RecordingActuator>, Arc<RecordingNotifier>>;

    fn engine_with(
        rules: RuleSet,
        log_channel: Option<u64>,
        recent: u32,
        actuator: Arc<RecordingActuator>,
        notifier: Arc<RecordingNotifier>,
    ) -> TestEngine {
        AutoModEngine::new(
            rules,
            log_channel,
            FixedArchive { count: recent },
            actuator,
            notifier,
        )
    }

    fn snapshot(content: &str) -> MessageSnapshot {
        MessageSnapshot {
            message_id: 42,
            channel_id: 10,
            author_id: 100,
            author_is_bot: false,
            content: content.to_string(),
            timestamp: Utc::now(),
            user_mentions: 0,
            role_mentions: 0,
        }
    }

    #[tokio::test]
    async fn bot_authors_are_exempt() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            RuleSet::default(),
            Some(999),
            // Way over the spam threshold; must still be ignored.
            50,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        let mut msg = snapshot("HELLO THERE discord.gg/abc https://evil.example");
        msg.author_is_bot = true;

        let outcome = engine.process_message(&msg).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(actuator.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(engine.user_violations(msg.author_id), 0);
    }

    #[tokio::test]
    async fn clean_message_has_no_side_effects() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            RuleSet::default(),
            Some(999),
            0,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        let outcome = engine.process_message(&snapshot("hello world")).await.unwrap();
        assert!(outcome.is_none());
        assert!(notifier.channel_messages.lock().unwrap().is_empty());
        assert!(notifier.dms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn profanity_delete_and_warn_end_to_end() {
        let mut rules = RuleSet::default();
        rules.profanity.words = vec!["badword".to_string()];
        rules.profanity.action = RuleAction::DeleteAndWarn;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(rules, Some(999), 0, Arc::clone(&actuator), Arc::clone(&notifier));

        let msg = snapshot("this has a badword in it");
        let outcome = engine
            .process_message(&msg)
            .await
            .unwrap()
            .expect("should flag");

        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].category, RuleCategory::Profanity);
        assert_eq!(outcome.highest_severity, Severity::High);

        // Deleted once, DM cites the category and the word.
        assert_eq!(actuator.deletes.load(Ordering::SeqCst), 1);
        let dms = notifier.dms.lock().unwrap();
        assert_eq!(dms.len(), 1);
        assert_eq!(dms[0].0, msg.author_id);
        assert!(dms[0].1.contains("profanity"));
        assert!(dms[0].1.contains("badword"));

        // Ledger counts the message once.
        assert_eq!(engine.user_violations(msg.author_id), 1);
    }

    #[tokio::test]
    async fn dm_failure_falls_back_to_channel_notice() {
        let mut rules = RuleSet::default();
        rules.profanity.words = vec!["badword".to_string()];
        rules.profanity.action = RuleAction::Warn;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier {
            dms_fail: true,
            ..Default::default()
        });
        let engine = engine_with(rules, None, 0, Arc::clone(&actuator), Arc::clone(&notifier));

        let msg = snapshot("a badword here");
        engine.process_message(&msg).await.unwrap();

        let channel_msgs = notifier.channel_messages.lock().unwrap();
        assert_eq!(channel_msgs.len(), 1);
        assert_eq!(channel_msgs[0].0, msg.channel_id);
        assert!(channel_msgs[0].1.contains(&format!("<@{}>", msg.author_id)));
    }

    #[tokio::test]
    async fn second_delete_failure_does_not_abort_dispatch() {
        // Two rules both set to delete; the second delete of an already
        // deleted message fails, and processing must still complete.
        let mut rules = RuleSet::default();
        rules.profanity.words = vec!["badword".to_string()];
        rules.profanity.action = RuleAction::Delete;
        rules.links.action = RuleAction::Delete;

        let actuator = Arc::new(RecordingActuator {
            fail_deletes_after_first: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            rules,
            Some(999),
            0,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        let msg = snapshot("badword and https://evil.example/x");
        let outcome = engine
            .process_message(&msg)
            .await
            .unwrap()
            .expect("should flag");

        assert_eq!(outcome.violations.len(), 2);
        assert_eq!(actuator.deletes.load(Ordering::SeqCst), 2);
        // Ledger and moderator log still happen after the failed delete.
        assert_eq!(engine.user_violations(msg.author_id), 1);
        assert_eq!(notifier.channel_messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn spam_uses_archive_window() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());

        // threshold - 1 prior messages: no violation.
        let engine = engine_with(
            RuleSet::default(),
            None,
            4,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );
        assert!(engine
            .process_message(&snapshot("hello"))
            .await
            .unwrap()
            .is_none());

        // exactly threshold prior messages: violation.
        let engine = engine_with(
            RuleSet::default(),
            None,
            5,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );
        let outcome = engine
            .process_message(&snapshot("hello"))
            .await
            .unwrap()
            .expect("should flag");
        assert_eq!(outcome.violations[0].category, RuleCategory::Spam);
    }

    #[tokio::test]
    async fn timeout_and_kick_are_dispatched() {
        let mut rules = RuleSet::default();
        // Lowered so the mostly-lowercase invite URL does not dilute the ratio.
        rules.caps.threshold = 0.4;
        rules.caps.action = RuleAction::Timeout;
        rules.invites.action = RuleAction::Kick;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(rules, None, 0, Arc::clone(&actuator), Arc::clone(&notifier));

        engine
            .process_message(&snapshot("COME JOIN US NOW discord.gg/abc"))
            .await
            .unwrap()
            .expect("should flag");

        assert_eq!(actuator.timeouts.load(Ordering::SeqCst), 1);
        assert_eq!(actuator.kicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ledger_counts_messages_not_violations() {
        let mut rules = RuleSet::default();
        rules.profanity.words = vec!["badword".to_string()];
        // Make each offending message produce two violations.
        rules.caps.threshold = 0.5;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(rules, None, 0, Arc::clone(&actuator), Arc::clone(&notifier));

        for _ in 0..3 {
            let outcome = engine
                .process_message(&snapshot("BADWORD YELLING"))
                .await
                .unwrap()
                .expect("should flag");
            assert!(outcome.violations.len() >= 2);
        }

        assert_eq!(engine.user_violations(100), 3);

        engine.reset_user_violations(100);
        assert_eq!(engine.user_violations(100), 0);
    }

    #[tokio::test]
    async fn disabled_rules_are_skipped() {
        let mut rules = RuleSet::default();
        rules.invites.enabled = false;
        rules.links.enabled = false;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(rules, None, 0, Arc::clone(&actuator), Arc::clone(&notifier));

        let outcome = engine
            .process_message(&snapshot("discord.gg/abc https://evil.example/x"))
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn unknown_rule_name_is_a_typed_error_and_changes_nothing() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            RuleSet::default(),
            None,
            0,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        let before = engine.rules().await;
        let update = RuleUpdate {
            enabled: Some(false),
            ..Default::default()
        };

        let err = engine
            .update_rule_by_name("nonexistent", &update)
            .await
            .unwrap_err();
        assert!(matches!(err, AutoModError::UnknownRule(_)));
        assert_eq!(engine.rules().await, before);

        // A valid name goes through the same path.
        engine.update_rule_by_name("caps", &update).await.unwrap();
        assert!(!engine.rules().await.caps.enabled);
    }

    #[tokio::test]
    async fn update_rule_merges_partially() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            RuleSet::default(),
            None,
            0,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        engine
            .update_rule(
                RuleCategory::Spam,
                &RuleUpdate {
                    threshold: Some(8),
                    ..Default::default()
                },
            )
            .await;

        let rules = engine.rules().await;
        assert_eq!(rules.spam.threshold, 8);
        // Untouched fields and categories keep their values.
        assert_eq!(rules.spam.timeframe_ms, 10_000);
        assert_eq!(rules.mentions.threshold, 5);
    }

    #[tokio::test]
    async fn replace_rules_swaps_the_whole_configuration() {
        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(
            RuleSet::default(),
            None,
            0,
            Arc::clone(&actuator),
            Arc::clone(&notifier),
        );

        let mut persisted = RuleSet::default();
        persisted.spam.threshold = 12;
        persisted.links.enabled = false;

        engine.replace_rules(persisted.clone()).await;
        assert_eq!(engine.rules().await, persisted);
    }

    #[tokio::test]
    async fn moderator_log_summarizes_once_per_message() {
        let mut rules = RuleSet::default();
        rules.profanity.words = vec!["badword".to_string()];
        rules.profanity.action = RuleAction::Delete;
        rules.caps.threshold = 0.5;
        rules.caps.action = RuleAction::Delete;

        let actuator = Arc::new(RecordingActuator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine_with(rules, Some(777), 0, Arc::clone(&actuator), Arc::clone(&notifier));

        engine
            .process_message(&snapshot("BADWORD YELLING"))
            .await
            .unwrap()
            .expect("should flag");

        let sent = notifier.channel_messages.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 777);
        assert!(sent[0].1.contains("2 violation(s)"));
        assert!(sent[0].1.contains("severity high"));
    }
}
