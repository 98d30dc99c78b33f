// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic rule engine)
// - `infra/` = Implementations of core traits (SQLite store, message cache)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::discord::automod::handler::AutoModManager;
use crate::discord::{Data, Error};
use crate::infra::automod::SqliteAutoModStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Every guild message goes through the auto-moderation engine.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Ignore bot messages (including our own)
        if new_message.author.bot {
            return Ok(());
        }

        match data.automod.handle_message(ctx, new_message).await {
            Ok(true) => {
                tracing::debug!(
                    message_id = new_message.id.get(),
                    "Message handled by auto-moderation"
                );
            }
            Ok(false) => {}
            Err(e) => {
                // One message's pass failed; the next message is unaffected.
                tracing::error!("Auto-moderation failed for message: {}", e);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Optional moderator log channel. Absent means no moderator notifications.
    let log_channel = std::env::var("LOG_CHANNEL_ID")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());
    if log_channel.is_none() {
        tracing::info!("LOG_CHANNEL_ID not set; moderator notifications are disabled");
    }

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let automod_db_path = format!("{}/automod.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let store = SqliteAutoModStore::open(&automod_db_path)
        .await
        .expect("Failed to open auto-moderation database");
    store
        .migrate()
        .await
        .expect("Failed to migrate auto-moderation database");

    let automod_manager = Arc::new(AutoModManager::new(store, log_channel));

    // Create the data structure that will be shared across all commands
    let data = Data {
        automod: Arc::clone(&automod_manager),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::automod::automod()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Register slash commands globally (can take up to an hour to
                // propagate). For faster development, use register_in_guild.
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
