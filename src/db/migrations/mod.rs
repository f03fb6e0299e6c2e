//! Database schema migrations.
//!
//! Migration files are stored in this directory with the naming convention:
//! - `migration_NN_up.sql` - Upgrades schema from version `NN-1` to version `NN`
//! - `migration_NN_down.sql` - Downgrades schema from version `NN` to version `NN-1`

use anyhow::{anyhow, Context};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// The schema version this build of the program expects.
pub(crate) const TARGET_VERSION: i32 = 1;

/// A database migration with up and down SQL.
struct Migration {
    /// The version this migration brings the database to (when going up).
    version: i32,
    /// SQL to execute when upgrading to this version.
    up_sql: &'static str,
    /// SQL to execute when downgrading from this version.
    down_sql: &'static str,
}

/// All available migrations in order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Runs migrations to bring the database from `current_ver` to `target_ver`.
///
/// - If `current_ver < target_ver`, runs "up" migrations sequentially.
/// - If `current_ver > target_ver`, runs "down" migrations sequentially.
/// - Each migration is executed within a transaction that includes the
///   schema_version update.
///
/// Validates all required migrations exist before running any of them.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Result<()> {
    if current_ver == target_ver {
        debug!("Database already at target version {target_ver}, no migrations needed");
        return Ok(());
    }

    // Validate all required migrations exist before running any
    validate_migrations(current_ver, target_ver)?;

    if current_ver < target_ver {
        // Run up migrations
        for version in (current_ver + 1)..=target_ver {
            let migration = find_migration(version)?;
            debug!("Running migration {version:02} (up)");
            run_single_migration(pool, migration.up_sql, version).await?;
        }
    } else {
        // Run down migrations
        for version in (target_ver + 1..=current_ver).rev() {
            let migration = find_migration(version)?;
            debug!("Running migration {version:02} (down)");
            run_single_migration(pool, migration.down_sql, version - 1).await?;
        }
    }
    Ok(())
}

fn find_migration(version: i32) -> Result<&'static Migration> {
    Ok(MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))?)
}

fn validate_migrations(current_ver: i32, target_ver: i32) -> Result<()> {
    let (low, high) = if current_ver < target_ver {
        (current_ver + 1, target_ver)
    } else {
        (target_ver + 1, current_ver)
    };
    for version in low..=high {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            return Err(anyhow!("Migration {version} is required but does not exist").into());
        }
    }
    Ok(())
}

/// Executes one migration's SQL and the version bump in a single transaction.
async fn run_single_migration(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = pool.begin().await.map_err(anyhow::Error::new)?;
    sqlx::raw_sql(sql)
        .execute(&mut *tx)
        .await
        .map_err(anyhow::Error::new)?;
    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .map_err(anyhow::Error::new)?;
    tx.commit().await.map_err(anyhow::Error::new)?;
    Ok(())
}
