// Auto-moderation slash commands for configuration and reporting.

use crate::core::automod::{RuleAction, RuleCategory, RuleSet, RuleUpdate};
use crate::discord::automod::handler::AutoModManager;
use crate::infra::automod::SqliteAutoModStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub automod: Arc<AutoModManager<SqliteAutoModStore>>,
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RuleChoice {
    #[name = "Spam"]
    Spam,
    #[name = "Profanity"]
    Profanity,
    #[name = "Caps"]
    Caps,
    #[name = "Links"]
    Links,
    #[name = "Mentions"]
    Mentions,
    #[name = "Invites"]
    Invites,
}

impl From<RuleChoice> for RuleCategory {
    fn from(choice: RuleChoice) -> Self {
        match choice {
            RuleChoice::Spam => RuleCategory::Spam,
            RuleChoice::Profanity => RuleCategory::Profanity,
            RuleChoice::Caps => RuleCategory::Caps,
            RuleChoice::Links => RuleCategory::Links,
            RuleChoice::Mentions => RuleCategory::Mentions,
            RuleChoice::Invites => RuleCategory::Invites,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ActionChoice {
    #[name = "Delete"]
    Delete,
    #[name = "Warn"]
    Warn,
    #[name = "Delete and warn"]
    DeleteAndWarn,
    #[name = "Timeout"]
    Timeout,
    #[name = "Kick"]
    Kick,
}

impl From<ActionChoice> for RuleAction {
    fn from(choice: ActionChoice) -> Self {
        match choice {
            ActionChoice::Delete => RuleAction::Delete,
            ActionChoice::Warn => RuleAction::Warn,
            ActionChoice::DeleteAndWarn => RuleAction::DeleteAndWarn,
            ActionChoice::Timeout => RuleAction::Timeout,
            ActionChoice::Kick => RuleAction::Kick,
        }
    }
}

/// Auto-moderation configuration commands.
///
/// Inspect and adjust the per-rule settings for your server.
#[poise::command(
    slash_command,
    subcommands(
        "status",
        "enable",
        "disable",
        "action",
        "threshold",
        "timeframe",
        "word_add",
        "word_remove",
        "violations",
        "reset"
    ),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn automod(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - shows help
    Ok(())
}

fn rule_summary(rules: &RuleSet) -> Vec<(String, String)> {
    fn flag(enabled: bool) -> &'static str {
        if enabled {
            "✅"
        } else {
            "❌"
        }
    }

    vec![
        (
            format!("{} Spam", flag(rules.spam.enabled)),
            format!(
                "**Action:** {}\n**Threshold:** {} msgs / {}s",
                rules.spam.action,
                rules.spam.threshold,
                rules.spam.timeframe_ms / 1000
            ),
        ),
        (
            format!("{} Profanity", flag(rules.profanity.enabled)),
            format!(
                "**Action:** {}\n**Words:** {}",
                rules.profanity.action,
                rules.profanity.words.len()
            ),
        ),
        (
            format!("{} Caps", flag(rules.caps.enabled)),
            format!(
                "**Action:** {}\n**Threshold:** {}%",
                rules.caps.action,
                (rules.caps.threshold * 100.0).round()
            ),
        ),
        (
            format!("{} Links", flag(rules.links.enabled)),
            format!(
                "**Action:** {}\n**Allowed:** {}",
                rules.links.action,
                rules.links.allowed_domains.join(", ")
            ),
        ),
        (
            format!("{} Mentions", flag(rules.mentions.enabled)),
            format!(
                "**Action:** {}\n**Threshold:** {}",
                rules.mentions.action, rules.mentions.threshold
            ),
        ),
        (
            format!("{} Invites", flag(rules.invites.enabled)),
            format!("**Action:** {}", rules.invites.action),
        ),
    ]
}

/// Show the current auto-moderation configuration.
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let rules = ctx
        .data()
        .automod
        .rules(guild_id.get(), &ctx.serenity_context().http)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let mut embed = serenity::CreateEmbed::new()
        .title("🛡️ Auto-Moderation Settings")
        .description("Current auto-moderation configuration")
        .color(0x5865F2);

    for (name, value) in rule_summary(&rules) {
        embed = embed.field(name, value, true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Enable one auto-moderation rule.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn enable(
    ctx: Context<'_>,
    #[description = "Rule to enable"] rule: RuleChoice,
) -> Result<(), Error> {
    set_enabled(ctx, rule, true).await
}

/// Disable one auto-moderation rule.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn disable(
    ctx: Context<'_>,
    #[description = "Rule to disable"] rule: RuleChoice,
) -> Result<(), Error> {
    set_enabled(ctx, rule, false).await
}

async fn set_enabled(ctx: Context<'_>, rule: RuleChoice, enabled: bool) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let category = RuleCategory::from(rule);

    ctx.data()
        .automod
        .update_rule(
            guild_id.get(),
            &ctx.serenity_context().http,
            category,
            &RuleUpdate {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.say(format!("The **{}** rule is now **{}**.", category, state))
        .await?;
    Ok(())
}

/// Change the action taken when a rule fires.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn action(
    ctx: Context<'_>,
    #[description = "Rule to change"] rule: RuleChoice,
    #[description = "Action to take when the rule fires"] action: ActionChoice,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let category = RuleCategory::from(rule);
    let action = RuleAction::from(action);

    ctx.data()
        .automod
        .update_rule(
            guild_id.get(),
            &ctx.serenity_context().http,
            category,
            &RuleUpdate {
                action: Some(action),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!(
        "The **{}** rule now uses the **{}** action.",
        category, action
    ))
    .await?;
    Ok(())
}

/// Change a rule's trigger threshold.
///
/// Spam and mentions take a message/mention count; caps takes a percentage.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn threshold(
    ctx: Context<'_>,
    #[description = "Rule to change"] rule: RuleChoice,
    #[description = "New threshold (count, or percent for caps)"]
    #[min = 1]
    #[max = 100]
    value: u32,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let category = RuleCategory::from(rule);

    let update = match category {
        RuleCategory::Spam | RuleCategory::Mentions => RuleUpdate {
            threshold: Some(value),
            ..Default::default()
        },
        RuleCategory::Caps => RuleUpdate {
            ratio: Some(f64::from(value) / 100.0),
            ..Default::default()
        },
        RuleCategory::Profanity | RuleCategory::Links | RuleCategory::Invites => {
            ctx.say(format!("The **{}** rule has no numeric threshold.", category))
                .await?;
            return Ok(());
        }
    };

    ctx.data()
        .automod
        .update_rule(guild_id.get(), &ctx.serenity_context().http, category, &update)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Updated the **{}** threshold to **{}**.", category, value))
        .await?;
    Ok(())
}

/// Change the spam rule's look-back window.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn timeframe(
    ctx: Context<'_>,
    #[description = "Window length in seconds"]
    #[min = 1]
    #[max = 300]
    seconds: u32,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .update_rule(
            guild_id.get(),
            &ctx.serenity_context().http,
            RuleCategory::Spam,
            &RuleUpdate {
                timeframe_ms: Some(u64::from(seconds) * 1000),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Spam window is now **{} seconds**.", seconds))
        .await?;
    Ok(())
}

/// Add a word to the profanity filter.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn word_add(
    ctx: Context<'_>,
    #[description = "Word to filter"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        ctx.say("That word is empty.").await?;
        return Ok(());
    }

    let http = &ctx.serenity_context().http;
    let mut words = ctx
        .data()
        .automod
        .rules(guild_id.get(), http)
        .await
        .map_err(|e| Error::from(e.to_string()))?
        .profanity
        .words;

    if words.contains(&word) {
        ctx.say("That word is already filtered.").await?;
        return Ok(());
    }
    words.push(word);
    let count = words.len();

    ctx.data()
        .automod
        .update_rule(
            guild_id.get(),
            http,
            RuleCategory::Profanity,
            &RuleUpdate {
                words: Some(words),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Added. The filter now holds **{}** word(s).", count))
        .await?;
    Ok(())
}

/// Remove a word from the profanity filter.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn word_remove(
    ctx: Context<'_>,
    #[description = "Word to remove"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let word = word.trim().to_lowercase();

    let http = &ctx.serenity_context().http;
    let mut words = ctx
        .data()
        .automod
        .rules(guild_id.get(), http)
        .await
        .map_err(|e| Error::from(e.to_string()))?
        .profanity
        .words;

    let before = words.len();
    words.retain(|w| *w != word);
    if words.len() == before {
        ctx.say("That word is not in the filter.").await?;
        return Ok(());
    }
    let count = words.len();

    ctx.data()
        .automod
        .update_rule(
            guild_id.get(),
            http,
            RuleCategory::Profanity,
            &RuleUpdate {
                words: Some(words),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Removed. The filter now holds **{}** word(s).", count))
        .await?;
    Ok(())
}

/// Show a user's auto-moderation record.
#[poise::command(slash_command, guild_only)]
pub async fn violations(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let (count, history) = ctx
        .data()
        .automod
        .user_violations(guild_id.get(), &ctx.serenity_context().http, user.id.get(), 10)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let history_text = if history.is_empty() {
        "No recorded violations.".to_string()
    } else {
        history
            .iter()
            .map(|r| {
                format!(
                    "`{}` **{}** ({}): {}",
                    r.created_at.format("%Y-%m-%d %H:%M"),
                    r.category,
                    r.severity,
                    r.reason
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("🛡️ Violations for {}", user.name))
        .color(if count == 0 { 0x00FF00 } else { 0xFFAA00 })
        .field(
            "Flagged messages since restart",
            count.to_string(),
            false,
        )
        .field("Recent history", history_text, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Reset a user's auto-moderation record.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn reset(
    ctx: Context<'_>,
    #[description = "User to reset"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .reset_user(guild_id.get(), &ctx.serenity_context().http, user.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("Cleared the auto-moderation record for **{}**.", user.name))
        .await?;
    Ok(())
}
