// Per-category message classifiers.
//
// Each classifier is a pure function from (snapshot, rule config) to an
// optional violation. They never short-circuit each other; the engine runs
// every enabled one and aggregates the results. Severity per category is
// fixed, only the action is configurable.

use super::automod_models::{
    CapsRule, InvitesRule, LinksRule, MentionsRule, MessageSnapshot, ProfanityRule, RuleAction,
    RuleCategory, Severity, SpamRule, Violation,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches discord.gg / discord.io / discord.me / discord.li short links and
/// full discordapp.com/invite URLs, with or without scheme and www.
static INVITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?(?:discord\.(?:gg|io|me|li)|discordapp\.com/invite)/[A-Za-z0-9]+")
        .expect("invite regex is valid")
});

/// Spam check against a precomputed window count.
///
/// `recent_count` is the number of messages from the same author in the same
/// channel within the rule's timeframe, as reported by the host's archive.
/// The archive holds only messages seen before the one under evaluation.
pub fn check_spam(recent_count: u32, rule: &SpamRule) -> Option<Violation> {
    if recent_count < rule.threshold {
        return None;
    }
    Some(Violation {
        category: RuleCategory::Spam,
        severity: Severity::Medium,
        reason: format!(
            "Sent {} messages in {} seconds",
            recent_count,
            rule.timeframe_ms / 1000
        ),
        action: rule.action,
    })
}

/// Case-insensitive substring match against the configured word list.
pub fn check_profanity(msg: &MessageSnapshot, rule: &ProfanityRule) -> Option<Violation> {
    let content = msg.content.to_lowercase();
    let found: Vec<&str> = rule
        .words
        .iter()
        .filter(|word| !word.is_empty() && content.contains(&word.to_lowercase()))
        .map(|word| word.as_str())
        .collect();

    if found.is_empty() {
        return None;
    }
    Some(Violation {
        category: RuleCategory::Profanity,
        severity: Severity::High,
        reason: format!("Used inappropriate language: {}", found.join(", ")),
        action: rule.action,
    })
}

/// Uppercase ratio over ASCII letters. Messages with no letters never fire.
pub fn check_caps(msg: &MessageSnapshot, rule: &CapsRule) -> Option<Violation> {
    let total_letters = msg
        .content
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .count();
    if total_letters == 0 {
        return None;
    }

    let caps_count = msg
        .content
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .count();
    let ratio = caps_count as f64 / total_letters as f64;
    if ratio < rule.threshold {
        return None;
    }

    Some(Violation {
        category: RuleCategory::Caps,
        severity: Severity::Low,
        reason: format!("Excessive caps usage: {}%", (ratio * 100.0).round()),
        action: rule.action,
    })
}

/// Whitespace-delimited scan for http(s) links not on the allow list.
pub fn check_links(msg: &MessageSnapshot, rule: &LinksRule) -> Option<Violation> {
    let links = msg.content.split_whitespace().filter_map(|token| {
        token
            .find("https://")
            .or_else(|| token.find("http://"))
            .map(|idx| &token[idx..])
    });

    let unauthorized: Vec<&str> = links
        .filter(|link| {
            !rule
                .allowed_domains
                .iter()
                .any(|domain| link.contains(domain.as_str()))
        })
        .collect();

    if unauthorized.is_empty() {
        return None;
    }
    Some(Violation {
        category: RuleCategory::Links,
        severity: Severity::Medium,
        reason: format!("Posted unauthorized links: {}", unauthorized.join(", ")),
        action: rule.action,
    })
}

/// Combined user + role mention count.
pub fn check_mentions(msg: &MessageSnapshot, rule: &MentionsRule) -> Option<Violation> {
    let mentions = msg.user_mentions + msg.role_mentions;
    if mentions < rule.threshold {
        return None;
    }
    Some(Violation {
        category: RuleCategory::Mentions,
        severity: Severity::Medium,
        reason: format!("Excessive mentions: {} in one message", mentions),
        action: rule.action,
    })
}

/// Discord invite URLs anywhere in the message.
///
/// Runs independently of the links rule: an allow-list entry for discord.gg
/// exempts a link from the links check only, never from this one.
pub fn check_invites(msg: &MessageSnapshot, rule: &InvitesRule) -> Option<Violation> {
    let invites: Vec<&str> = INVITE_RE
        .find_iter(&msg.content)
        .map(|m| m.as_str())
        .collect();

    if invites.is_empty() {
        return None;
    }
    Some(Violation {
        category: RuleCategory::Invites,
        severity: Severity::High,
        reason: format!("Posted Discord invite: {}", invites.join(", ")),
        action: rule.action,
    })
}

/// Fold the worst severity out of a violation list, starting from Low.
pub fn highest_severity(violations: &[Violation]) -> Severity {
    violations
        .iter()
        .fold(Severity::Low, |highest, v| {
            if v.severity > highest {
                v.severity
            } else {
                highest
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::automod::automod_models::RuleSet;
    use chrono::Utc;

    fn snapshot(content: &str) -> MessageSnapshot {
        MessageSnapshot {
            message_id: 1,
            channel_id: 10,
            author_id: 100,
            author_is_bot: false,
            content: content.to_string(),
            timestamp: Utc::now(),
            user_mentions: 0,
            role_mentions: 0,
        }
    }

    #[test]
    fn spam_fires_at_threshold_not_below() {
        let rule = RuleSet::default().spam;
        assert_eq!(rule.threshold, 5);

        assert!(check_spam(4, &rule).is_none());
        let violation = check_spam(5, &rule).expect("should fire at threshold");
        assert_eq!(violation.severity, Severity::Medium);
        assert_eq!(violation.reason, "Sent 5 messages in 10 seconds");
    }

    #[test]
    fn profanity_lists_all_matched_words() {
        let rule = ProfanityRule {
            enabled: true,
            words: vec!["badword".to_string(), "worse".to_string()],
            action: RuleAction::DeleteAndWarn,
        };

        assert!(check_profanity(&snapshot("all good here"), &rule).is_none());

        let violation =
            check_profanity(&snapshot("a BadWord and worse stuff"), &rule).expect("should fire");
        assert_eq!(violation.severity, Severity::High);
        assert!(violation.reason.contains("badword"));
        assert!(violation.reason.contains("worse"));
    }

    #[test]
    fn caps_never_fires_without_letters() {
        let rule = RuleSet::default().caps;
        assert!(check_caps(&snapshot("1234 !!! :)"), &rule).is_none());
        assert!(check_caps(&snapshot(""), &rule).is_none());
    }

    #[test]
    fn caps_fires_at_ratio_threshold() {
        let rule = RuleSet::default().caps;

        // 5 of 10 letters uppercase: 50%, under the 70% default.
        assert!(check_caps(&snapshot("HELLO world"), &rule).is_none());

        // 10 of 10 letters uppercase.
        let violation = check_caps(&snapshot("HELLO THERE"), &rule).expect("should fire");
        assert_eq!(violation.severity, Severity::Low);
        assert_eq!(violation.reason, "Excessive caps usage: 100%");
    }

    #[test]
    fn links_respects_allow_list() {
        let rule = RuleSet::default().links;

        assert!(check_links(&snapshot("watch https://youtube.com/x"), &rule).is_none());

        let violation =
            check_links(&snapshot("see https://evil.example/x now"), &rule).expect("should fire");
        assert!(violation.reason.contains("https://evil.example/x"));
        assert_eq!(violation.severity, Severity::Medium);
    }

    #[test]
    fn links_ignores_plain_text_tokens() {
        let rule = RuleSet::default().links;
        assert!(check_links(&snapshot("http is a protocol, no link here"), &rule).is_none());
    }

    #[test]
    fn mentions_fires_at_combined_threshold() {
        let rule = RuleSet::default().mentions;

        let mut msg = snapshot("hi everyone");
        msg.user_mentions = 3;
        msg.role_mentions = 1;
        assert!(check_mentions(&msg, &rule).is_none());

        msg.role_mentions = 2;
        let violation = check_mentions(&msg, &rule).expect("should fire");
        assert!(violation.reason.contains("5"));
    }

    #[test]
    fn invites_fire_regardless_of_link_allow_list() {
        // discord.gg is on the default link allow list; the invite rule must
        // still catch it.
        let links = RuleSet::default().links;
        let invites = RuleSet::default().invites;
        let msg = snapshot("join us: discord.gg/abc123");

        assert!(check_links(&msg, &links).is_none());
        let violation = check_invites(&msg, &invites).expect("should fire");
        assert_eq!(violation.severity, Severity::High);
        assert!(violation.reason.contains("discord.gg/abc123"));
    }

    #[test]
    fn invites_match_full_urls_and_other_hosts() {
        let rule = RuleSet::default().invites;
        assert!(check_invites(&snapshot("https://discordapp.com/invite/xyz"), &rule).is_some());
        assert!(check_invites(&snapshot("www.discord.io/abc"), &rule).is_some());
        assert!(check_invites(&snapshot("discordless text"), &rule).is_none());
    }

    #[test]
    fn highest_severity_picks_worst() {
        fn v(severity: Severity) -> Violation {
            Violation {
                category: RuleCategory::Caps,
                severity,
                reason: String::new(),
                action: RuleAction::Warn,
            }
        }

        assert_eq!(highest_severity(&[]), Severity::Low);
        assert_eq!(
            highest_severity(&[v(Severity::Low), v(Severity::High), v(Severity::Medium)]),
            Severity::High
        );
    }
}
