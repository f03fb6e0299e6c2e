//! This module is responsible for reading, writing and managing the SQLite
//! database that backs user registration and per-conversation pending state.

mod migrations;

use crate::error::Result;
use crate::identity::User;
use crate::model::PendingState;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(anyhow!("A database file already exists at '{}'", path.display()).into());
        }
        let pool = connect(path, true).await?;
        ensure_version_table(&pool).await?;
        migrations::run(&pool, current_version(&pool).await?, migrations::TARGET_VERSION).await?;
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("The database file is missing at '{}'", path.display()).into());
        }
        let pool = connect(path, false).await?;
        ensure_version_table(&pool).await?;
        migrations::run(&pool, current_version(&pool).await?, migrations::TARGET_VERSION).await?;
        Ok(Self { pool })
    }

    /// An in-memory database for tests.
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Unable to open an in-memory SQLite database")?;
        ensure_version_table(&pool).await?;
        migrations::run(&pool, current_version(&pool).await?, migrations::TARGET_VERSION).await?;
        Ok(Self { pool })
    }

    // ---- users ----

    pub(crate) async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, external_id, display_name, spreadsheet_id FROM users WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query users")?;
        row.map(user_from_row).transpose()
    }

    pub(crate) async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, external_id, display_name, spreadsheet_id) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.display_name)
        .bind(&user.spreadsheet_id)
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;
        Ok(())
    }

    pub(crate) async fn update_user_spreadsheet(
        &self,
        user_id: Uuid,
        spreadsheet_id: &str,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE users SET spreadsheet_id = ? WHERE id = ?")
            .bind(spreadsheet_id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update user configuration")?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("No user with id {user_id}").into());
        }
        Ok(())
    }

    // ---- pending states ----

    pub(crate) async fn get_pending(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        let row = sqlx::query(
            "SELECT active_command, label, created_at FROM pending_states WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query pending state")?;
        row.map(pending_from_row).transpose()
    }

    /// Upsert: a conversation holds at most one pending state.
    pub(crate) async fn put_pending(
        &self,
        conversation_id: &str,
        state: &PendingState,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO pending_states (conversation_id, active_command, label, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(conversation_id) DO UPDATE SET \
             active_command = excluded.active_command, \
             label = excluded.label, \
             created_at = excluded.created_at",
        )
        .bind(conversation_id)
        .bind(&state.active_command)
        .bind(&state.label)
        .bind(state.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to store pending state")?;
        Ok(())
    }

    /// Deletes and returns the conversation's pending state, if any.
    pub(crate) async fn delete_pending(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PendingState>> {
        let existing = self.get_pending(conversation_id).await?;
        if existing.is_some() {
            sqlx::query("DELETE FROM pending_states WHERE conversation_id = ?")
                .bind(conversation_id)
                .execute(&self.pool)
                .await
                .context("Failed to clear pending state")?;
        }
        Ok(existing)
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true);
    Ok(SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at '{}'", path.display()))?)
}

async fn ensure_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Unable to create schema_version table")?;
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Unable to read schema_version")?
        .get("n");
    if count == 0 {
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(pool)
            .await
            .context("Unable to seed schema_version")?;
    }
    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i32> {
    let version: i32 = sqlx::query("SELECT version FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Unable to read schema version")?
        .get("version");
    Ok(version)
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    Ok(User {
        id: Uuid::parse_str(&id).context("Bad user id in database")?,
        external_id: row.get("external_id"),
        display_name: row.get("display_name"),
        spreadsheet_id: row.get("spreadsheet_id"),
    })
}

fn pending_from_row(row: sqlx::sqlite::SqliteRow) -> Result<PendingState> {
    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .context("Bad created_at in database")?
        .with_timezone(&Utc);
    Ok(PendingState {
        active_command: row.get("active_command"),
        label: row.get("label"),
        created_at,
    })
}
