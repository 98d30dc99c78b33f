// SQLite-backed auto-moderation store.
//
// Tables:
// - automod_rules: Per-guild rule configuration, stored as a JSON blob so
//   the schema does not chase every per-category field.
// - automod_violations: Append-only violation history for reporting.

use crate::core::automod::{
    AutoModError, AutoModStore, RuleCategory, RuleSet, Severity, ViolationRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub struct SqliteAutoModStore {
    pool: Pool<Sqlite>,
}

impl SqliteAutoModStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open a file-backed store, creating the file if needed.
    pub async fn open(database_path: &str) -> anyhow::Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS automod_rules (
                guild_id INTEGER PRIMARY KEY,
                rules TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS automod_violations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                severity TEXT NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_automod_violations_guild_user
                ON automod_violations(guild_id, user_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_severity(s: &str) -> Severity {
    match s {
        "low" => Severity::Low,
        "medium" => Severity::Medium,
        "high" => Severity::High,
        "critical" => Severity::Critical,
        _ => Severity::Low,
    }
}

#[async_trait]
impl AutoModStore for SqliteAutoModStore {
    async fn load_rules(&self, guild_id: u64) -> Result<Option<RuleSet>, AutoModError> {
        let row = sqlx::query("SELECT rules FROM automod_rules WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AutoModError::Storage(e.to_string()))?;

        match row {
            Some(row) => {
                let json: String = row.get("rules");
                let rules = serde_json::from_str(&json)
                    .map_err(|e| AutoModError::Storage(e.to_string()))?;
                Ok(Some(rules))
            }
            None => Ok(None),
        }
    }

    async fn save_rules(&self, guild_id: u64, rules: &RuleSet) -> Result<(), AutoModError> {
        let json =
            serde_json::to_string(rules).map_err(|e| AutoModError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO automod_rules (guild_id, rules)
            VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                rules = excluded.rules
            "#,
        )
        .bind(guild_id as i64)
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(|e| AutoModError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn record_violation(&self, record: ViolationRecord) -> Result<(), AutoModError> {
        sqlx::query(
            r#"
            INSERT INTO automod_violations (guild_id, user_id, category, severity, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.guild_id as i64)
        .bind(record.user_id as i64)
        .bind(record.category.to_string())
        .bind(record.severity.to_string())
        .bind(&record.reason)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AutoModError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn recent_violations(
        &self,
        guild_id: u64,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<ViolationRecord>, AutoModError> {
        let rows = sqlx::query(
            r#"
            SELECT category, severity, reason, created_at
            FROM automod_violations
            WHERE guild_id = ? AND user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AutoModError::Storage(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let category_str: String = row.get("category");
            let severity_str: String = row.get("severity");
            let reason: String = row.get("reason");
            let created_at_str: String = row.get("created_at");

            let category = RuleCategory::from_str(&category_str)
                .map_err(|e| AutoModError::Storage(e.to_string()))?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            records.push(ViolationRecord {
                guild_id,
                user_id,
                category,
                severity: parse_severity(&severity_str),
                reason,
                created_at,
            });
        }
        Ok(records)
    }

    async fn clear_violations(&self, guild_id: u64, user_id: u64) -> Result<(), AutoModError> {
        sqlx::query("DELETE FROM automod_violations WHERE guild_id = ? AND user_id = ?")
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| AutoModError::Storage(e.to_string()))?;
        Ok(())
    }
}
