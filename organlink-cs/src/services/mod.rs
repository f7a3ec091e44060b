//! External collaborator adapters and the matching pass
//!
//! The oracle and ledger are deliberately simulated: they honor their
//! documented contracts (delay, value range, tx-hash shape) without any
//! real model or chain behind them. The ledger optionally hands
//! record_match off to an HTTP gateway.

pub mod ledger;
pub mod match_engine;
pub mod oracle;

pub use ledger::{LedgerClient, LedgerError};
pub use match_engine::{run_matching_pass, MatchingPassOutcome};
pub use oracle::ScoreOracle;
