//! SQLite-backed store for persisted access-state snapshots.
//!
//! One row per profile key; the console uses a single fixed key per
//! session. Read once at startup, overwritten after every successful
//! resolution, deleted on logout.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use merchdesk_access::AccessSnapshot;

/// Local snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Open (creating if necessary) the store at the given path.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create snapshot directory at {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open snapshot store at {:?}", path))?;

        Self::init(pool).await
    }

    /// Open the store at the default per-user location.
    pub async fn open_default() -> anyhow::Result<Self> {
        Self::open(&default_db_path()?).await
    }

    /// In-memory store (tests).
    ///
    /// Capped at one connection: each SQLite in-memory connection is its own
    /// database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("failed to build in-memory SQLite options")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open in-memory snapshot store")?;

        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_snapshots (
                profile     TEXT PRIMARY KEY,
                data        TEXT NOT NULL,
                resolved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create access_snapshots table")?;

        Ok(Self { pool })
    }

    /// Persist (upsert) the snapshot for a profile.
    pub async fn save(&self, profile: &str, snapshot: &AccessSnapshot) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string(snapshot).context("failed to serialize access snapshot")?;

        sqlx::query(
            r#"
            INSERT INTO access_snapshots (profile, data, resolved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(profile)
            DO UPDATE SET
                data = excluded.data,
                resolved_at = excluded.resolved_at
            "#,
        )
        .bind(profile)
        .bind(&payload)
        .bind(snapshot.resolved_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("failed to upsert access snapshot")?;

        Ok(())
    }

    /// Load the snapshot for a profile, if present and not older than
    /// `max_age`.
    pub async fn load(
        &self,
        profile: &str,
        max_age: Option<chrono::Duration>,
    ) -> anyhow::Result<Option<AccessSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT data, resolved_at
            FROM access_snapshots
            WHERE profile = ?1
            "#,
        )
        .bind(profile)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch access snapshot")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let resolved_at_str: String = row.try_get("resolved_at")?;
        let resolved_at = DateTime::parse_from_rfc3339(&resolved_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .context("invalid resolved_at timestamp in snapshot store")?;

        if let Some(max) = max_age {
            let age = Utc::now().signed_duration_since(resolved_at);
            if age > max {
                return Ok(None);
            }
        }

        let data: String = row.try_get("data")?;
        let snapshot =
            serde_json::from_str(&data).context("failed to deserialize access snapshot")?;

        Ok(Some(snapshot))
    }

    /// Remove the snapshot for a profile (logout).
    pub async fn clear(&self, profile: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM access_snapshots
            WHERE profile = ?1
            "#,
        )
        .bind(profile)
        .execute(&self.pool)
        .await
        .context("failed to clear access snapshot")?;

        Ok(())
    }
}

/// Resolve the path to the snapshot database:
/// `{app_data_dir}/merchdesk/session.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory")?;

    let mut dir = base;
    dir.push("merchdesk");
    dir.push("session.db");

    Ok(dir)
}
