// Auto-moderation domain models - data structures for the rule engine.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts these to Discord-specific actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of rule categories the engine knows about.
///
/// Using an enum instead of string keys means an unknown category is a parse
/// error at the edge, not a silent no-op deep inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    Spam,
    Profanity,
    Caps,
    Links,
    Mentions,
    Invites,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleCategory::Spam => "spam",
            RuleCategory::Profanity => "profanity",
            RuleCategory::Caps => "caps",
            RuleCategory::Links => "links",
            RuleCategory::Mentions => "mentions",
            RuleCategory::Invites => "invites",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RuleCategory {
    type Err = super::AutoModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spam" => Ok(RuleCategory::Spam),
            "profanity" => Ok(RuleCategory::Profanity),
            "caps" => Ok(RuleCategory::Caps),
            "links" => Ok(RuleCategory::Links),
            "mentions" => Ok(RuleCategory::Mentions),
            "invites" => Ok(RuleCategory::Invites),
            other => Err(super::AutoModError::UnknownRule(other.to_string())),
        }
    }
}

/// How bad a violation is, for reporting. Does not select the action.
///
/// Ord follows declaration order: Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// What to do when a rule fires. Each category carries its own action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Delete,
    Warn,
    DeleteAndWarn,
    Timeout,
    Kick,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleAction::Delete => "delete",
            RuleAction::Warn => "warn",
            RuleAction::DeleteAndWarn => "delete_and_warn",
            RuleAction::Timeout => "timeout",
            RuleAction::Kick => "kick",
        };
        write!(f, "{}", name)
    }
}

/// Spam rule: too many messages from one author in one channel within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamRule {
    pub enabled: bool,
    /// Window message count at which the rule fires.
    pub threshold: u32,
    /// Length of the look-back window in milliseconds.
    pub timeframe_ms: u64,
    pub action: RuleAction,
}

/// Profanity rule: case-insensitive substring match against a word list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfanityRule {
    pub enabled: bool,
    pub words: Vec<String>,
    pub action: RuleAction,
}

/// Caps rule: ratio of uppercase letters to all letters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsRule {
    pub enabled: bool,
    /// Ratio in [0, 1] at which the rule fires.
    pub threshold: f64,
    pub action: RuleAction,
}

/// Links rule: http(s) links not covered by the allow list.
///
/// The allow list only exempts a link from this rule. The invites rule runs
/// on its own and will still flag discord.gg links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksRule {
    pub enabled: bool,
    pub allowed_domains: Vec<String>,
    pub action: RuleAction,
}

/// Mentions rule: combined user and role mention count in one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionsRule {
    pub enabled: bool,
    pub threshold: u32,
    pub action: RuleAction,
}

/// Invites rule: Discord invite URLs anywhere in the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitesRule {
    pub enabled: bool,
    pub action: RuleAction,
}

/// Full rule configuration for one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub spam: SpamRule,
    pub profanity: ProfanityRule,
    pub caps: CapsRule,
    pub links: LinksRule,
    pub mentions: MentionsRule,
    pub invites: InvitesRule,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            spam: SpamRule {
                enabled: true,
                threshold: 5,
                timeframe_ms: 10_000,
                action: RuleAction::DeleteAndWarn,
            },
            profanity: ProfanityRule {
                enabled: true,
                // Empty by default; admins fill this per guild.
                words: Vec::new(),
                action: RuleAction::DeleteAndWarn,
            },
            caps: CapsRule {
                enabled: true,
                threshold: 0.7,
                action: RuleAction::Warn,
            },
            links: LinksRule {
                enabled: true,
                allowed_domains: vec![
                    "discord.gg".to_string(),
                    "youtube.com".to_string(),
                    "twitch.tv".to_string(),
                ],
                action: RuleAction::DeleteAndWarn,
            },
            mentions: MentionsRule {
                enabled: true,
                threshold: 5,
                action: RuleAction::Warn,
            },
            invites: InvitesRule {
                enabled: true,
                action: RuleAction::DeleteAndWarn,
            },
        }
    }
}

/// Partial update merged into one category's configuration.
///
/// Fields that do not apply to the target category are ignored.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub enabled: Option<bool>,
    pub action: Option<RuleAction>,
    pub threshold: Option<u32>,
    pub timeframe_ms: Option<u64>,
    pub ratio: Option<f64>,
    pub words: Option<Vec<String>>,
    pub allowed_domains: Option<Vec<String>>,
}

impl RuleSet {
    /// Merge an update into the named category. Unrelated categories are
    /// never touched.
    pub fn apply(&mut self, category: RuleCategory, update: &RuleUpdate) {
        match category {
            RuleCategory::Spam => {
                let rule = &mut self.spam;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
                if let Some(threshold) = update.threshold {
                    rule.threshold = threshold;
                }
                if let Some(timeframe_ms) = update.timeframe_ms {
                    rule.timeframe_ms = timeframe_ms;
                }
            }
            RuleCategory::Profanity => {
                let rule = &mut self.profanity;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
                if let Some(words) = &update.words {
                    rule.words = words.clone();
                }
            }
            RuleCategory::Caps => {
                let rule = &mut self.caps;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
                if let Some(ratio) = update.ratio {
                    rule.threshold = ratio.clamp(0.0, 1.0);
                }
            }
            RuleCategory::Links => {
                let rule = &mut self.links;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
                if let Some(domains) = &update.allowed_domains {
                    rule.allowed_domains = domains.clone();
                }
            }
            RuleCategory::Mentions => {
                let rule = &mut self.mentions;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
                if let Some(threshold) = update.threshold {
                    rule.threshold = threshold;
                }
            }
            RuleCategory::Invites => {
                let rule = &mut self.invites;
                if let Some(enabled) = update.enabled {
                    rule.enabled = enabled;
                }
                if let Some(action) = update.action {
                    rule.action = action;
                }
            }
        }
    }
}

/// Immutable view of one message, as handed to every classifier.
#[derive(Debug, Clone)]
pub struct MessageSnapshot {
    pub message_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Distinct user mentions in the message.
    pub user_mentions: u32,
    /// Distinct role mentions in the message.
    pub role_mentions: u32,
}

/// One detected rule breach. A classifier emits at most one per message.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub category: RuleCategory,
    pub severity: Severity,
    pub reason: String,
    pub action: RuleAction,
}

/// Everything the engine decided about one offending message.
#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub violations: Vec<Violation>,
    pub highest_severity: Severity,
}
