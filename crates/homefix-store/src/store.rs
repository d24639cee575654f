//! SQLite store for profiles and analyses

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use homefix_core::{AnalysisResult, HomeProfile};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Fixed-width timestamps so text ordering matches time ordering
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::Corrupt {
            column,
            value: value.to_string(),
        })
}

/// A home profile as stored
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    /// Owner
    pub user_id: String,
    /// Profile attributes
    pub profile: HomeProfile,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

/// A saved diagnosis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
    /// Analysis id
    pub id: Uuid,
    /// Owner, when the request named one
    pub user_id: Option<String>,
    /// Problem description the analysis answered
    pub description: String,
    /// Normalized result
    pub result: AnalysisResult,
    /// When it was saved
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed store
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wrap an existing pool. Call [`Store::init`] before use.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url` and initialize the schema
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.init().await?;
        info!(url = %url, "SQLite store initialized");
        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                profile_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                description TEXT NOT NULL,
                result_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_user_created ON analyses(user_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("store schema initialized");
        Ok(())
    }

    /// Create or replace a user's home profile
    pub async fn upsert_profile(&self, user_id: &str, profile: &HomeProfile) -> Result<StoredProfile> {
        let updated_at = Utc::now();
        let profile_json = serde_json::to_string(profile)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO profiles (user_id, profile_json, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&profile_json)
        .bind(timestamp(updated_at))
        .execute(&self.pool)
        .await?;

        Ok(StoredProfile {
            user_id: user_id.to_string(),
            profile: profile.clone(),
            updated_at,
        })
    }

    /// Load a user's home profile
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<StoredProfile>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, profile_json, updated_at
            FROM profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let profile_json: String = row.get("profile_json");
                let updated_at: String = row.get("updated_at");
                Ok(Some(StoredProfile {
                    user_id: row.get("user_id"),
                    profile: serde_json::from_str(&profile_json)?,
                    updated_at: parse_timestamp("updated_at", &updated_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Delete a user's home profile; true when one existed
    pub async fn delete_profile(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Save a diagnosis and return its id
    pub async fn save_analysis(
        &self,
        user_id: Option<&str>,
        description: &str,
        result: &AnalysisResult,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let result_json = serde_json::to_string(result)?;

        sqlx::query(
            r#"
            INSERT INTO analyses (id, user_id, description, result_json, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(user_id)
        .bind(description)
        .bind(&result_json)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        debug!(analysis_id = %id, "analysis saved");
        Ok(id)
    }

    /// Load one saved analysis
    pub async fn get_analysis(&self, id: Uuid) -> Result<Option<SavedAnalysis>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, description, result_json, created_at
            FROM analyses
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::analysis_from_row(&row)).transpose()
    }

    /// A user's saved analyses, newest first
    pub async fn list_analyses(&self, user_id: &str, limit: u32) -> Result<Vec<SavedAnalysis>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, description, result_json, created_at
            FROM analyses
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::analysis_from_row).collect()
    }

    /// Delete a saved analysis; true when one existed
    pub async fn delete_analysis(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn analysis_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SavedAnalysis> {
        let id: String = row.get("id");
        let result_json: String = row.get("result_json");
        let created_at: String = row.get("created_at");

        Ok(SavedAnalysis {
            id: Uuid::parse_str(&id).map_err(|_| Error::Corrupt {
                column: "id",
                value: id.clone(),
            })?,
            user_id: row.get("user_id"),
            description: row.get("description"),
            result: serde_json::from_str(&result_json)?,
            created_at: parse_timestamp("created_at", &created_at)?,
        })
    }
}
