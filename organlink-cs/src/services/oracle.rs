//! Simulated AI scoring oracle
//!
//! Contract: `second_opinion` returns an integer in [1,99] after an
//! artificial delay. The score annotates proposed matches for display;
//! it never affects eligibility or ranking.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use organlink_common::Result;

use crate::db::settings;

pub struct ScoreOracle {
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl ScoreOracle {
    /// A seeded oracle yields a reproducible score sequence; unseeded
    /// draws from entropy.
    pub fn new(delay_ms: u64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ScoreOracle {
            delay: Duration::from_millis(delay_ms),
            rng: Mutex::new(rng),
        }
    }

    /// Build from the `oracle_delay_ms` and `oracle_seed` settings.
    pub async fn from_settings(pool: &SqlitePool) -> Result<Self> {
        let delay_ms = settings::get_oracle_delay_ms(pool).await?;
        let seed = settings::get_oracle_seed(pool).await?;
        Ok(ScoreOracle::new(delay_ms, seed))
    }

    /// Produce the oracle's opinion of a match, in [1,99].
    pub async fn second_opinion(&self) -> i64 {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut rng = self.rng.lock().await;
        rng.gen_range(1..=99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_opinion_stays_in_range() {
        let oracle = ScoreOracle::new(0, None);
        for _ in 0..200 {
            let score = oracle.second_opinion().await;
            assert!((1..=99).contains(&score), "score {} out of range", score);
        }
    }

    #[tokio::test]
    async fn test_seeded_oracle_is_deterministic() {
        let first = ScoreOracle::new(0, Some(7));
        let second = ScoreOracle::new(0, Some(7));
        for _ in 0..20 {
            assert_eq!(first.second_opinion().await, second.second_opinion().await);
        }
    }

    #[tokio::test]
    async fn test_different_seeds_diverge() {
        let first = ScoreOracle::new(0, Some(1));
        let second = ScoreOracle::new(0, Some(2));
        let a: Vec<i64> = {
            let mut v = Vec::new();
            for _ in 0..10 {
                v.push(first.second_opinion().await);
            }
            v
        };
        let b: Vec<i64> = {
            let mut v = Vec::new();
            for _ in 0..10 {
                v.push(second.second_opinion().await);
            }
            v
        };
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_from_settings_reads_delay_and_seed() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        organlink_common::db::init::create_settings_table(&pool)
            .await
            .unwrap();
        settings::set_setting(&pool, "oracle_delay_ms", 0u64)
            .await
            .unwrap();
        settings::set_setting(&pool, "oracle_seed", 42u64)
            .await
            .unwrap();

        let from_db = ScoreOracle::from_settings(&pool).await.unwrap();
        let direct = ScoreOracle::new(0, Some(42));
        assert_eq!(from_db.second_opinion().await, direct.second_opinion().await);
    }
}
