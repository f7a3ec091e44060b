//! Database initialization
//!
//! Creates organlink.db on first run with the full schema, then applies
//! pending migrations and default settings. Safe to call from several
//! processes at once; every step is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL mode allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_schema_version_table(&pool).await?;
    create_settings_table(&pool).await?;
    create_hospitals_table(&pool).await?;
    create_doctors_table(&pool).await?;
    create_donors_table(&pool).await?;
    create_recipients_table(&pool).await?;
    create_approvals_table(&pool).await?;
    create_matches_table(&pool).await?;

    // Versioned migrations for databases created by older builds
    crate::db::migrations::run_migrations(&pool).await?;

    // Default settings
    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the hospitals table
///
/// Hospitals register, await approval, and once approved can accept
/// doctor registrations. The ledger fields record the simulated
/// verification transaction written on approval.
pub async fn create_hospitals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hospitals (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT,
            contact_email TEXT NOT NULL UNIQUE,
            license_number TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            ledger_verified INTEGER NOT NULL DEFAULT 0,
            verification_tx TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_hospitals_status ON hospitals(status)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the doctors table
///
/// Doctors belong to an approved hospital.
pub async fn create_doctors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doctors (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            specialty TEXT,
            license_number TEXT NOT NULL UNIQUE,
            contact_email TEXT NOT NULL,
            hospital_id TEXT NOT NULL REFERENCES hospitals(guid) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doctors_hospital ON doctors(hospital_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doctors_status ON doctors(status)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the donors table
///
/// Organs and medical_history are JSON array text. badge_token holds the
/// simulated NFT badge minted when the donor is approved.
pub async fn create_donors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS donors (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            phone TEXT,
            city TEXT,
            blood_type TEXT NOT NULL CHECK (blood_type IN ('O-', 'O+', 'A-', 'A+', 'B-', 'B+', 'AB-', 'AB+')),
            organs TEXT NOT NULL DEFAULT '[]',
            age INTEGER,
            medical_history TEXT NOT NULL DEFAULT '[]',
            available INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            hospital_id TEXT REFERENCES hospitals(guid) ON DELETE SET NULL,
            badge_token TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (age IS NULL OR (age > 0 AND age < 130))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_donors_status ON donors(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_donors_blood_type ON donors(blood_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_donors_available ON donors(available)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the recipients table
pub async fn create_recipients_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipients (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            phone TEXT,
            city TEXT,
            blood_type TEXT NOT NULL CHECK (blood_type IN ('O-', 'O+', 'A-', 'A+', 'B-', 'B+', 'AB-', 'AB+')),
            required_organ TEXT NOT NULL,
            urgency_level INTEGER NOT NULL CHECK (urgency_level >= 1 AND urgency_level <= 10),
            age INTEGER,
            medical_history TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
            hospital_id TEXT REFERENCES hospitals(guid) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (age IS NULL OR (age > 0 AND age < 130))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipients_status ON recipients(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipients_blood_type ON recipients(blood_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipients_organ ON recipients(required_organ)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the approvals table
///
/// One row per admin decision, forming the audit trail. The entity's own
/// status column holds the current state; this table holds the history.
pub async fn create_approvals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS approvals (
            guid TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL CHECK (entity_type IN ('donor', 'recipient', 'hospital', 'doctor')),
            entity_id TEXT NOT NULL,
            decision TEXT NOT NULL CHECK (decision IN ('approved', 'rejected')),
            reviewer TEXT NOT NULL,
            note TEXT,
            decided_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_approvals_entity ON approvals(entity_type, entity_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the matches table
///
/// One row per proposed donor/recipient/organ pairing with the scoring
/// outcome, the oracle's second opinion, and the ledger transaction hash
/// once recorded.
pub async fn create_matches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            guid TEXT PRIMARY KEY,
            donor_id TEXT NOT NULL REFERENCES donors(guid) ON DELETE CASCADE,
            recipient_id TEXT NOT NULL REFERENCES recipients(guid) ON DELETE CASCADE,
            organ TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score >= 0 AND score <= 100),
            blood_relation TEXT NOT NULL CHECK (blood_relation IN ('identical', 'compatible')),
            reasons TEXT NOT NULL DEFAULT '[]',
            predicted_success TEXT NOT NULL,
            predicted_complications TEXT NOT NULL,
            recommendation TEXT NOT NULL,
            oracle_score INTEGER,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed', 'rejected')),
            tx_hash TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            decided_at TIMESTAMP,
            CHECK (oracle_score IS NULL OR (oracle_score >= 1 AND oracle_score <= 99))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_matches_recipient ON matches(recipient_id, status)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_donor ON matches(donor_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_score ON matches(score)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values; NULL values
/// are reset to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Matching settings
    ensure_setting(pool, "matching_scoring_model", "profile").await?;
    ensure_setting(pool, "matching_max_age_gap_years", "15").await?;

    // Scoring oracle stub settings
    ensure_setting(pool, "oracle_delay_ms", "400").await?;
    ensure_setting(pool, "oracle_seed", "").await?; // empty = unseeded

    // Ledger stub settings
    ensure_setting(pool, "ledger_delay_ms", "400").await?;
    ensure_setting(pool, "ledger_gateway_url", "").await?; // empty = simulated

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization: multiple
        // processes may pass the exists check simultaneously
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!(
            "Initialized setting '{}' with default value: {}",
            key, default_value
        );
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!(
            "Setting '{}' was NULL, reset to default: {}",
            key, default_value
        );
    }

    Ok(())
}
