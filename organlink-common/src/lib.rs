//! # OrganLink Common Library
//!
//! Shared code for the OrganLink coordination platform including:
//! - Database schema, initialization and migrations
//! - Event types (OrganLinkEvent enum) and the EventBus
//! - API authentication helpers
//! - Configuration loading and root folder resolution
//! - The donor/recipient matching domain core (blood types, urgency,
//!   compatibility scoring)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod matching;
pub mod sse;

pub use error::{Error, Result};
pub use matching::{BloodType, ScoringModel, Urgency};
