//! Runtime settings stored in the database
//!
//! The settings table is the source of truth for tunable behavior
//! (scoring model, oracle and ledger knobs, shared secret). Values are
//! stored as TEXT and parsed on read.

use organlink_common::matching::{MatchingPolicy, ScoringModel};
use organlink_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::warn;

/// Read a single setting, parsed into the requested type.
///
/// Returns `Ok(None)` when the key is absent. A present but unparseable
/// value is a configuration error.
pub async fn get_setting<T: FromStr>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            // value is nullable; NULL is treated the same as a missing key
            let raw: Option<String> = row.get("value");
            match raw {
                Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                    Error::Config(format!("Setting '{}' has unparseable value '{}'", key, raw))
                }),
                None => Ok(None),
            }
        }
        None => Ok(None),
    }
}

/// Write a single setting, inserting or replacing as needed.
pub async fn set_setting<T: ToString>(pool: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load the matching policy (scoring model plus age-gap limit).
///
/// An unknown model name is downgraded to the default with a warning so
/// a hand-edited settings row cannot wedge the matching pass.
pub async fn get_matching_policy(pool: &SqlitePool) -> Result<MatchingPolicy> {
    let model = match get_setting::<String>(pool, "matching_scoring_model").await? {
        Some(raw) => raw.parse::<ScoringModel>().unwrap_or_else(|_| {
            warn!("Unknown matching_scoring_model '{}', using default", raw);
            ScoringModel::default()
        }),
        None => ScoringModel::default(),
    };

    let max_age_gap_years = get_setting::<i64>(pool, "matching_max_age_gap_years")
        .await?
        .unwrap_or(15)
        .clamp(0, 120);

    Ok(MatchingPolicy {
        model,
        max_age_gap_years,
    })
}

/// Persist the active scoring model.
pub async fn set_scoring_model(pool: &SqlitePool, model: ScoringModel) -> Result<()> {
    set_setting(pool, "matching_scoring_model", model.as_str()).await
}

/// Oracle scoring delay in milliseconds, clamped to [0, 60000].
pub async fn get_oracle_delay_ms(pool: &SqlitePool) -> Result<u64> {
    let delay = get_setting::<u64>(pool, "oracle_delay_ms")
        .await?
        .unwrap_or(400);
    Ok(delay.min(60_000))
}

/// Optional oracle RNG seed. Absent or empty means non-deterministic.
pub async fn get_oracle_seed(pool: &SqlitePool) -> Result<Option<u64>> {
    match get_setting::<String>(pool, "oracle_seed").await? {
        Some(raw) if !raw.trim().is_empty() => {
            let seed = raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("Setting 'oracle_seed' has unparseable value '{}'", raw))
            })?;
            Ok(Some(seed))
        }
        _ => Ok(None),
    }
}

/// Ledger operation delay in milliseconds, clamped to [0, 60000].
pub async fn get_ledger_delay_ms(pool: &SqlitePool) -> Result<u64> {
    let delay = get_setting::<u64>(pool, "ledger_delay_ms")
        .await?
        .unwrap_or(400);
    Ok(delay.min(60_000))
}

/// Optional external ledger gateway URL. Absent or empty means simulate.
pub async fn get_ledger_gateway_url(pool: &SqlitePool) -> Result<Option<String>> {
    match get_setting::<String>(pool, "ledger_gateway_url").await? {
        Some(raw) if !raw.trim().is_empty() => Ok(Some(raw.trim().to_string())),
        _ => Ok(None),
    }
}
