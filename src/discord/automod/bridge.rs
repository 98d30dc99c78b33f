// Discord-backed implementations of the engine's capability traits.
//
// One bridge per guild: timeout and kick need the guild id, delete and the
// notifier paths only need ids carried by the snapshot.

use crate::core::automod::{ActuationError, ModerationActuator, Notifier};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SerenityBridge {
    http: Arc<serenity::Http>,
    guild_id: serenity::GuildId,
}

impl SerenityBridge {
    pub fn new(http: Arc<serenity::Http>, guild_id: u64) -> Self {
        Self {
            http,
            guild_id: serenity::GuildId::new(guild_id),
        }
    }
}

#[async_trait]
impl ModerationActuator for SerenityBridge {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ActuationError> {
        self.http
            .delete_message(
                serenity::ChannelId::new(channel_id),
                serenity::MessageId::new(message_id),
                Some("Auto-moderation"),
            )
            .await
            .map_err(|e| ActuationError(e.to_string()))
    }

    async fn timeout_member(
        &self,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), ActuationError> {
        let until = serenity::Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| ActuationError(e.to_string()))?;

        self.guild_id
            .edit_member(
                &self.http,
                serenity::UserId::new(user_id),
                serenity::EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(reason),
            )
            .await
            .map_err(|e| ActuationError(e.to_string()))?;
        Ok(())
    }

    async fn kick_member(&self, user_id: u64, reason: &str) -> Result<(), ActuationError> {
        self.guild_id
            .kick_with_reason(&self.http, serenity::UserId::new(user_id), reason)
            .await
            .map_err(|e| ActuationError(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SerenityBridge {
    async fn send_private_message(
        &self,
        user_id: u64,
        content: &str,
    ) -> Result<(), ActuationError> {
        let channel = serenity::UserId::new(user_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(|e| ActuationError(e.to_string()))?;
        channel
            .id
            .say(&self.http, content)
            .await
            .map_err(|e| ActuationError(e.to_string()))?;
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<(), ActuationError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map_err(|e| ActuationError(e.to_string()))?;
        Ok(())
    }
}
