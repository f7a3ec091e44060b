//! Simulated blockchain ledger adapter
//!
//! Default backend fabricates transaction hashes (`0x` + 64 hex chars)
//! after a configurable delay. When `ledger_gateway_url` is set,
//! `record_match` POSTs the match to that gateway instead and returns its
//! tx_hash; every other operation stays simulated. Gateway failures never
//! touch the match row itself.

use std::time::Duration;

use rand::Rng;
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use organlink_common::db::models::EntityType;
use organlink_common::Error as CommonError;

use crate::db::matches::MatchRecord;
use crate::db::settings;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger gateway error: {0}")]
    Gateway(String),
}

enum Backend {
    Simulated,
    Gateway { url: String, http: reqwest::Client },
}

pub struct LedgerClient {
    delay: Duration,
    backend: Backend,
}

impl LedgerClient {
    /// Fully simulated client.
    pub fn simulated(delay_ms: u64) -> Self {
        LedgerClient {
            delay: Duration::from_millis(delay_ms),
            backend: Backend::Simulated,
        }
    }

    /// Client that hands `record_match` to an HTTP gateway.
    pub fn with_gateway(delay_ms: u64, url: String) -> organlink_common::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| CommonError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(LedgerClient {
            delay: Duration::from_millis(delay_ms),
            backend: Backend::Gateway { url, http },
        })
    }

    /// Build from the `ledger_delay_ms` and `ledger_gateway_url` settings.
    pub async fn from_settings(pool: &SqlitePool) -> organlink_common::Result<Self> {
        let delay_ms = settings::get_ledger_delay_ms(pool).await?;
        match settings::get_ledger_gateway_url(pool).await? {
            Some(url) => LedgerClient::with_gateway(delay_ms, url),
            None => Ok(LedgerClient::simulated(delay_ms)),
        }
    }

    async fn simulate(&self, operation: &str) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let tx_hash = random_tx_hash();
        debug!("Ledger {} simulated, tx {}", operation, tx_hash);
        tx_hash
    }

    /// Record a proposed or decided match on the ledger.
    ///
    /// The only operation the gateway backend handles itself; everything
    /// else simulates regardless of backend.
    pub async fn record_match(&self, record: &MatchRecord) -> Result<String, LedgerError> {
        match &self.backend {
            Backend::Simulated => Ok(self.simulate("record_match").await),
            Backend::Gateway { url, http } => {
                let payload = json!({
                    "match_id": record.guid,
                    "donor_id": record.donor_id,
                    "recipient_id": record.recipient_id,
                    "organ": record.organ,
                    "score": record.score,
                    "status": record.status,
                    "created_at": record.created_at,
                });

                let response = http
                    .post(url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| LedgerError::Gateway(format!("request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(LedgerError::Gateway(format!(
                        "gateway returned {}",
                        response.status()
                    )));
                }

                let body: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| LedgerError::Gateway(format!("invalid response body: {}", e)))?;

                body.get("tx_hash")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| LedgerError::Gateway("response missing tx_hash".to_string()))
            }
        }
    }

    /// Log a donor registration. Fire-and-forget from the caller's side.
    pub async fn register_donor(&self, donor_id: Uuid) -> String {
        debug!("Ledger register_donor for {}", donor_id);
        self.simulate("register_donor").await
    }

    /// Verify an approved hospital's license on the ledger.
    pub async fn verify_hospital(&self, hospital_id: Uuid) -> String {
        debug!("Ledger verify_hospital for {}", hospital_id);
        self.simulate("verify_hospital").await
    }

    /// Mint the donor's badge token on approval.
    pub async fn mint_badge(&self, donor_id: Uuid) -> String {
        debug!("Ledger mint_badge for {}", donor_id);
        self.simulate("mint_badge").await
    }

    /// File a fraud report against an entity.
    pub async fn report_fraud(&self, entity_type: EntityType, entity_id: Uuid) -> String {
        debug!("Ledger report_fraud for {} {}", entity_type, entity_id);
        self.simulate("report_fraud").await
    }

    /// Fraud likelihood for an entity, in [1,100]. Stub contract.
    pub async fn fraud_score(&self, entity_type: EntityType, entity_id: Uuid) -> i64 {
        debug!("Ledger fraud_score for {} {}", entity_type, entity_id);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        rand::thread_rng().gen_range(1..=100)
    }
}

/// A fabricated transaction hash: `0x` followed by 64 hex characters.
pub fn random_tx_hash() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}
