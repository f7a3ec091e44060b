//! Database schema migrations
//!
//! Versioned schema migrations allowing seamless database upgrades
//! without manual deletion or data loss. Existing migrations must never
//! change; each schema change gets a new migration function. Migrations
//! must be idempotent (safe to run multiple times) and prefer ALTER TABLE
//! over DROP/CREATE to preserve data.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// Increment this when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: Add badge_token column to donors table
///
/// Badge minting on donor approval was added after the initial schema;
/// databases created before it lack the column.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add badge_token column to donors");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='donors'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        // Table doesn't exist yet - will be created with correct schema
        info!("  Donors table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('donors') WHERE name = 'badge_token'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  badge_token column already exists - skipping");
        return Ok(());
    }

    sqlx::query("ALTER TABLE donors ADD COLUMN badge_token TEXT")
        .execute(pool)
        .await?;

    info!("  ✓ Added badge_token column to donors table");
    Ok(())
}

/// Migration v2: Add tx_hash column to matches table
///
/// Ledger recording of matches landed after the first release.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: Add tx_hash column to matches");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='matches'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        info!("  Matches table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('matches') WHERE name = 'tx_hash'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  tx_hash column already exists - skipping");
        return Ok(());
    }

    // Catch duplicate column error for concurrent initialization races
    match sqlx::query("ALTER TABLE matches ADD COLUMN tx_hash TEXT")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  ✓ Added tx_hash column to matches table");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            info!("  tx_hash column added by concurrent process - skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
