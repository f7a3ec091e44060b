//! Donor/recipient matching domain core
//!
//! Pure compatibility rules shared by the coordination server and its tests:
//! blood-type donation compatibility, the eligibility pre-filter, and the
//! weighted compatibility scoring with its derived outcome labels.
//!
//! Everything in this module is synchronous and free of I/O so the same
//! rules can be exercised from unit tests, the match engine, and one-off
//! pair previews without a database in reach.

pub mod blood;
pub mod scoring;

pub use blood::BloodType;
pub use scoring::{
    check_eligibility, score_pair, BloodRelation, CompatibilityReport, DonorProfile, Exclusion,
    MatchingPolicy, OutcomeBand, RecipientProfile, ScoringModel, Urgency,
};
