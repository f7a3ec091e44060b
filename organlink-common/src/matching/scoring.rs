//! Eligibility pre-filter and weighted compatibility scoring
//!
//! A donor/recipient pair first passes `check_eligibility`, which applies the
//! hard constraints (availability, organ on offer, blood compatibility, and
//! under the profile model an age-gap ceiling). Eligible pairs are then
//! scored by `score_pair` under one of two weighting models. Scores are
//! clamped to 0..=100 and mapped to outcome labels by `OutcomeBand`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::matching::blood::BloodType;

/// Recipient urgency tier derived from the 1..=10 clinical level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    /// Tier for a numeric urgency level. Levels outside 1..=10 saturate
    /// into the nearest tier.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=3 => Urgency::Low,
            4..=6 => Urgency::Medium,
            7..=8 => Urgency::High,
            _ => Urgency::Critical,
        }
    }

    /// Representative numeric level for a tier, used when intake supplies
    /// a categorical urgency instead of a number.
    pub fn representative_level(&self) -> i64 {
        match self {
            Urgency::Low => 2,
            Urgency::Medium => 5,
            Urgency::High => 8,
            Urgency::Critical => 10,
        }
    }

    /// Profile-model score contribution for this tier.
    fn profile_points(&self) -> u32 {
        match self {
            Urgency::Low => 5,
            Urgency::Medium => 10,
            Urgency::High => 15,
            Urgency::Critical => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Critical => "Critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            _ => Err(Error::InvalidInput(format!("unknown urgency: {}", s))),
        }
    }
}

/// Donor attributes the matcher needs, detached from storage rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorProfile {
    pub blood_type: BloodType,
    /// Organs this donor has pledged, free-form names like "Kidney".
    pub organs: Vec<String>,
    pub age: Option<i64>,
    pub medical_history: Vec<String>,
    pub available: bool,
}

impl DonorProfile {
    /// Case- and whitespace-insensitive check for a pledged organ.
    pub fn offers_organ(&self, organ: &str) -> bool {
        self.organs.iter().any(|o| organ_eq(o, organ))
    }
}

/// Recipient attributes the matcher needs, detached from storage rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientProfile {
    pub blood_type: BloodType,
    pub required_organ: String,
    pub age: Option<i64>,
    /// Clinical urgency level, 1..=10.
    pub urgency_level: i64,
    pub medical_history: Vec<String>,
}

impl RecipientProfile {
    pub fn urgency(&self) -> Urgency {
        Urgency::from_level(self.urgency_level)
    }
}

fn organ_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Which weighting model `score_pair` applies.
///
/// `Profile` weighs the full donor/recipient profiles (blood, age gap,
/// urgency, shared history). `Registry` is the coarser intake weighting
/// (blood, organ on offer, raw urgency level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringModel {
    Profile,
    Registry,
}

impl Default for ScoringModel {
    fn default() -> Self {
        ScoringModel::Profile
    }
}

impl ScoringModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringModel::Profile => "profile",
            ScoringModel::Registry => "registry",
        }
    }
}

impl fmt::Display for ScoringModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(ScoringModel::Profile),
            "registry" => Ok(ScoringModel::Registry),
            _ => Err(Error::InvalidInput(format!("unknown scoring model: {}", s))),
        }
    }
}

/// Matching knobs resolved from settings by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingPolicy {
    pub model: ScoringModel,
    /// Age-gap ceiling in years. Only binds under the profile model, and
    /// only when both ages are known.
    pub max_age_gap_years: i64,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        MatchingPolicy {
            model: ScoringModel::Profile,
            max_age_gap_years: 15,
        }
    }
}

/// Hard constraint that removed a pair before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exclusion {
    DonorUnavailable,
    OrganNotOffered { required: String },
    BloodIncompatible { donor: BloodType, recipient: BloodType },
    AgeGapTooWide { gap: i64, limit: i64 },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::DonorUnavailable => write!(f, "donor is not available"),
            Exclusion::OrganNotOffered { required } => {
                write!(f, "donor does not offer required organ {}", required)
            }
            Exclusion::BloodIncompatible { donor, recipient } => {
                write!(f, "blood type {} cannot donate to {}", donor, recipient)
            }
            Exclusion::AgeGapTooWide { gap, limit } => {
                write!(f, "age gap of {} years exceeds limit of {}", gap, limit)
            }
        }
    }
}

/// Applies the hard constraints in order: donor availability, organ on
/// offer, blood compatibility, then the profile-model age-gap ceiling.
/// Returns the first constraint that fails.
pub fn check_eligibility(
    donor: &DonorProfile,
    recipient: &RecipientProfile,
    policy: &MatchingPolicy,
) -> Result<(), Exclusion> {
    if !donor.available {
        return Err(Exclusion::DonorUnavailable);
    }
    if !donor.offers_organ(&recipient.required_organ) {
        return Err(Exclusion::OrganNotOffered {
            required: recipient.required_organ.clone(),
        });
    }
    if !donor.blood_type.can_donate_to(recipient.blood_type) {
        return Err(Exclusion::BloodIncompatible {
            donor: donor.blood_type,
            recipient: recipient.blood_type,
        });
    }
    if policy.model == ScoringModel::Profile {
        if let (Some(d), Some(r)) = (donor.age, recipient.age) {
            let gap = (d - r).abs();
            if gap > policy.max_age_gap_years {
                return Err(Exclusion::AgeGapTooWide {
                    gap,
                    limit: policy.max_age_gap_years,
                });
            }
        }
    }
    Ok(())
}

/// How the donor's blood group relates to the recipient's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloodRelation {
    Identical,
    Compatible,
    Incompatible,
}

impl BloodRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodRelation::Identical => "identical",
            BloodRelation::Compatible => "compatible",
            BloodRelation::Incompatible => "incompatible",
        }
    }
}

impl fmt::Display for BloodRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodRelation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identical" => Ok(BloodRelation::Identical),
            "compatible" => Ok(BloodRelation::Compatible),
            "incompatible" => Ok(BloodRelation::Incompatible),
            _ => Err(Error::InvalidInput(format!("unknown blood relation: {}", s))),
        }
    }
}

/// Score band with its presentation labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeBand {
    Excellent,
    Strong,
    Good,
    Fair,
    Poor,
}

impl OutcomeBand {
    /// Band for a clamped 0..=100 score.
    pub fn for_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => OutcomeBand::Excellent,
            80..=89 => OutcomeBand::Strong,
            70..=79 => OutcomeBand::Good,
            60..=69 => OutcomeBand::Fair,
            _ => OutcomeBand::Poor,
        }
    }

    /// Predicted success likelihood label shown to coordinators.
    pub fn predicted_success(&self) -> &'static str {
        match self {
            OutcomeBand::Excellent => "Very High (>95%)",
            OutcomeBand::Strong => "High (85-95%)",
            OutcomeBand::Good => "Good (70-85%)",
            OutcomeBand::Fair => "Moderate (60-70%)",
            OutcomeBand::Poor => "Low (<60%)",
        }
    }

    /// Predicted complication risk label.
    pub fn predicted_complications(&self) -> &'static str {
        match self {
            OutcomeBand::Excellent => "Minimal",
            OutcomeBand::Strong => "Low",
            OutcomeBand::Good => "Moderate",
            OutcomeBand::Fair | OutcomeBand::Poor => "High",
        }
    }

    /// Coordinator-facing recommendation label.
    pub fn recommendation(&self) -> &'static str {
        match self {
            OutcomeBand::Excellent | OutcomeBand::Strong => "Highly recommended",
            OutcomeBand::Good => "Recommended",
            OutcomeBand::Fair => "Consider",
            OutcomeBand::Poor => "Not recommended",
        }
    }
}

/// Result of scoring one donor/recipient pair.
#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReport {
    /// Clamped 0..=100 compatibility score.
    pub score: u8,
    pub blood_relation: BloodRelation,
    /// Human-readable contributions, in scoring order.
    pub reasons: Vec<String>,
    pub band: OutcomeBand,
}

/// Scores a pair under the given model. Total function: incompatible pairs
/// simply earn no blood points, so callers that want the hard constraints
/// enforced run `check_eligibility` first.
pub fn score_pair(
    donor: &DonorProfile,
    recipient: &RecipientProfile,
    model: ScoringModel,
) -> CompatibilityReport {
    let blood_relation = if donor.blood_type == recipient.blood_type {
        BloodRelation::Identical
    } else if donor.blood_type.can_donate_to(recipient.blood_type) {
        BloodRelation::Compatible
    } else {
        BloodRelation::Incompatible
    };

    let mut total: u32 = 0;
    let mut reasons = Vec::new();

    match model {
        ScoringModel::Profile => {
            match blood_relation {
                BloodRelation::Identical => {
                    total += 40;
                    reasons.push(format!("Identical blood type ({})", donor.blood_type));
                }
                BloodRelation::Compatible => {
                    total += 30;
                    reasons.push(format!(
                        "Compatible blood type ({} donor to {} recipient)",
                        donor.blood_type, recipient.blood_type
                    ));
                }
                BloodRelation::Incompatible => {}
            }

            if let (Some(d), Some(r)) = (donor.age, recipient.age) {
                let gap = (d - r).abs();
                if gap <= 5 {
                    total += 20;
                    reasons.push(format!("Close age match ({} year gap)", gap));
                } else if gap <= 10 {
                    total += 15;
                    reasons.push(format!("Moderate age gap ({} years)", gap));
                } else if gap <= 15 {
                    total += 10;
                    reasons.push(format!("Acceptable age gap ({} years)", gap));
                }
            }

            let urgency = recipient.urgency();
            total += urgency.profile_points();
            reasons.push(format!(
                "{} urgency (level {})",
                urgency, recipient.urgency_level
            ));

            let shared = shared_conditions(&donor.medical_history, &recipient.medical_history);
            if shared == 0 {
                total += 20;
                reasons.push("No shared medical conditions".to_string());
            } else if shared <= 2 {
                total += 10;
                reasons.push(format!("{} shared medical condition(s)", shared));
            } else {
                reasons.push(format!("{} shared medical conditions", shared));
            }
        }
        ScoringModel::Registry => {
            match blood_relation {
                BloodRelation::Identical => {
                    total += 50;
                    reasons.push(format!("Identical blood type ({})", donor.blood_type));
                }
                BloodRelation::Compatible => {
                    total += 35;
                    reasons.push(format!(
                        "Compatible blood type ({} donor to {} recipient)",
                        donor.blood_type, recipient.blood_type
                    ));
                }
                BloodRelation::Incompatible => {}
            }

            if donor.offers_organ(&recipient.required_organ) {
                total += 40;
                reasons.push(format!(
                    "Required organ offered ({})",
                    recipient.required_organ
                ));
            }

            let level = recipient.urgency_level.clamp(0, 10) as u32;
            total += level;
            reasons.push(format!("Urgency level {}", recipient.urgency_level));
        }
    }

    let score = total.min(100) as u8;
    CompatibilityReport {
        score,
        blood_relation,
        reasons,
        band: OutcomeBand::for_score(score),
    }
}

/// Number of distinct conditions appearing in both histories, compared
/// case-insensitively after trimming.
fn shared_conditions(donor: &[String], recipient: &[String]) -> usize {
    use std::collections::HashSet;
    let donor_set: HashSet<String> = donor
        .iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    let recipient_set: HashSet<String> = recipient
        .iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    donor_set.intersection(&recipient_set).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor(blood: BloodType) -> DonorProfile {
        DonorProfile {
            blood_type: blood,
            organs: vec!["Kidney".to_string()],
            age: Some(30),
            medical_history: Vec::new(),
            available: true,
        }
    }

    fn recipient(blood: BloodType) -> RecipientProfile {
        RecipientProfile {
            blood_type: blood,
            required_organ: "Kidney".to_string(),
            age: Some(32),
            urgency_level: 10,
            medical_history: Vec::new(),
        }
    }

    #[test]
    fn urgency_tiers_from_level() {
        assert_eq!(Urgency::from_level(1), Urgency::Low);
        assert_eq!(Urgency::from_level(3), Urgency::Low);
        assert_eq!(Urgency::from_level(4), Urgency::Medium);
        assert_eq!(Urgency::from_level(6), Urgency::Medium);
        assert_eq!(Urgency::from_level(7), Urgency::High);
        assert_eq!(Urgency::from_level(8), Urgency::High);
        assert_eq!(Urgency::from_level(9), Urgency::Critical);
        assert_eq!(Urgency::from_level(10), Urgency::Critical);
        // Out-of-range levels saturate.
        assert_eq!(Urgency::from_level(0), Urgency::Low);
        assert_eq!(Urgency::from_level(12), Urgency::Critical);
    }

    #[test]
    fn urgency_representative_levels_round_trip() {
        for tier in [
            Urgency::Low,
            Urgency::Medium,
            Urgency::High,
            Urgency::Critical,
        ] {
            assert_eq!(Urgency::from_level(tier.representative_level()), tier);
        }
    }

    #[test]
    fn urgency_parses_case_insensitively() {
        assert_eq!("critical".parse::<Urgency>().unwrap(), Urgency::Critical);
        assert_eq!(" High ".parse::<Urgency>().unwrap(), Urgency::High);
        assert!("urgent".parse::<Urgency>().is_err());
    }

    #[test]
    fn compatible_pair_scores_ninety_under_profile_model() {
        // O- donor (30, kidney, clean history) against an AB+ critical
        // recipient (32): 30 blood + 20 age + 20 urgency + 20 history.
        let d = donor(BloodType::ONeg);
        let r = recipient(BloodType::ABPos);
        assert!(check_eligibility(&d, &r, &MatchingPolicy::default()).is_ok());

        let report = score_pair(&d, &r, ScoringModel::Profile);
        assert_eq!(report.score, 90);
        assert_eq!(report.blood_relation, BloodRelation::Compatible);
        assert_eq!(report.band, OutcomeBand::Excellent);
        assert_eq!(report.band.predicted_success(), "Very High (>95%)");
        assert_eq!(report.band.predicted_complications(), "Minimal");
        assert_eq!(report.band.recommendation(), "Highly recommended");
        assert!(report
            .reasons
            .iter()
            .any(|reason| reason.contains("Compatible blood type")));
        assert!(report
            .reasons
            .iter()
            .any(|reason| reason.contains("Critical urgency")));
    }

    #[test]
    fn identical_pair_reaches_full_profile_score() {
        let d = donor(BloodType::APos);
        let mut r = recipient(BloodType::APos);
        r.age = Some(30);
        let report = score_pair(&d, &r, ScoringModel::Profile);
        assert_eq!(report.score, 100);
        assert_eq!(report.blood_relation, BloodRelation::Identical);
    }

    #[test]
    fn identical_blood_outranks_compatible() {
        let identical = score_pair(
            &donor(BloodType::APos),
            &recipient(BloodType::APos),
            ScoringModel::Profile,
        );
        let compatible = score_pair(
            &donor(BloodType::ONeg),
            &recipient(BloodType::APos),
            ScoringModel::Profile,
        );
        assert!(identical.score > compatible.score);
    }

    #[test]
    fn incompatible_blood_earns_no_blood_points() {
        let report = score_pair(
            &donor(BloodType::APos),
            &recipient(BloodType::BPos),
            ScoringModel::Profile,
        );
        assert_eq!(report.blood_relation, BloodRelation::Incompatible);
        // Age 20 + urgency 20 + history 20, no blood contribution.
        assert_eq!(report.score, 60);
    }

    #[test]
    fn age_bands_step_down_with_gap() {
        let mut r = recipient(BloodType::ABPos);
        let d = donor(BloodType::ONeg);

        r.age = Some(33); // 3-year gap
        let close = score_pair(&d, &r, ScoringModel::Profile).score;
        r.age = Some(38); // 8-year gap
        let moderate = score_pair(&d, &r, ScoringModel::Profile).score;
        r.age = Some(43); // 13-year gap
        let acceptable = score_pair(&d, &r, ScoringModel::Profile).score;
        r.age = Some(50); // 20-year gap
        let wide = score_pair(&d, &r, ScoringModel::Profile).score;

        assert_eq!(close, 90);
        assert_eq!(moderate, 85);
        assert_eq!(acceptable, 80);
        assert_eq!(wide, 70);
    }

    #[test]
    fn missing_age_is_neutral() {
        let mut d = donor(BloodType::ONeg);
        d.age = None;
        let r = recipient(BloodType::ABPos);
        let report = score_pair(&d, &r, ScoringModel::Profile);
        // 30 blood + 20 urgency + 20 history, no age contribution.
        assert_eq!(report.score, 70);
        assert!(!report.reasons.iter().any(|reason| reason.contains("age")));
    }

    #[test]
    fn higher_urgency_never_scores_lower() {
        let d = donor(BloodType::ONeg);
        let mut r = recipient(BloodType::ABPos);
        let mut previous = 0;
        for level in 1..=10 {
            r.urgency_level = level;
            let score = score_pair(&d, &r, ScoringModel::Profile).score;
            assert!(score >= previous, "level {} dropped the score", level);
            previous = score;
        }
    }

    #[test]
    fn shared_history_reduces_score() {
        let mut d = donor(BloodType::ONeg);
        let mut r = recipient(BloodType::ABPos);

        d.medical_history = vec!["Diabetes".to_string(), "Hypertension".to_string()];
        r.medical_history = Vec::new();
        assert_eq!(score_pair(&d, &r, ScoringModel::Profile).score, 90);

        r.medical_history = vec!["diabetes".to_string()];
        assert_eq!(score_pair(&d, &r, ScoringModel::Profile).score, 80);

        d.medical_history = vec![
            "Diabetes".to_string(),
            "Hypertension".to_string(),
            "Asthma".to_string(),
        ];
        r.medical_history = d.medical_history.clone();
        assert_eq!(score_pair(&d, &r, ScoringModel::Profile).score, 70);
    }

    #[test]
    fn registry_model_weights() {
        // Identical blood 50 + organ 40 + urgency 10.
        let report = score_pair(
            &donor(BloodType::APos),
            &recipient(BloodType::APos),
            ScoringModel::Registry,
        );
        assert_eq!(report.score, 100);

        // Compatible blood 35 + organ 40 + urgency 7.
        let mut r = recipient(BloodType::ABPos);
        r.urgency_level = 7;
        let report = score_pair(&donor(BloodType::ANeg), &r, ScoringModel::Registry);
        assert_eq!(report.score, 82);

        // No organ on offer drops the organ term.
        let mut d = donor(BloodType::ANeg);
        d.organs = vec!["Liver".to_string()];
        let report = score_pair(&d, &r, ScoringModel::Registry);
        assert_eq!(report.score, 42);
    }

    #[test]
    fn scores_stay_within_bounds_across_models() {
        for donor_blood in BloodType::ALL {
            for recipient_blood in BloodType::ALL {
                let d = donor(donor_blood);
                let mut r = recipient(recipient_blood);
                for level in [1, 5, 10, 25] {
                    r.urgency_level = level;
                    for model in [ScoringModel::Profile, ScoringModel::Registry] {
                        let report = score_pair(&d, &r, model);
                        assert!(report.score <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn eligibility_rejects_unavailable_donor() {
        let mut d = donor(BloodType::ONeg);
        d.available = false;
        let r = recipient(BloodType::ABPos);
        assert_eq!(
            check_eligibility(&d, &r, &MatchingPolicy::default()),
            Err(Exclusion::DonorUnavailable)
        );
    }

    #[test]
    fn eligibility_rejects_missing_organ() {
        let mut d = donor(BloodType::ONeg);
        d.organs = vec!["Liver".to_string()];
        let r = recipient(BloodType::ABPos);
        assert!(matches!(
            check_eligibility(&d, &r, &MatchingPolicy::default()),
            Err(Exclusion::OrganNotOffered { .. })
        ));
    }

    #[test]
    fn eligibility_matches_organs_case_insensitively() {
        let mut d = donor(BloodType::ONeg);
        d.organs = vec!["kidney ".to_string()];
        let r = recipient(BloodType::ABPos);
        assert!(check_eligibility(&d, &r, &MatchingPolicy::default()).is_ok());
    }

    #[test]
    fn eligibility_rejects_incompatible_blood() {
        let d = donor(BloodType::APos);
        let r = recipient(BloodType::BPos);
        assert!(matches!(
            check_eligibility(&d, &r, &MatchingPolicy::default()),
            Err(Exclusion::BloodIncompatible { .. })
        ));
    }

    #[test]
    fn age_gap_ceiling_only_binds_profile_model() {
        let mut d = donor(BloodType::ONeg);
        d.age = Some(30);
        let mut r = recipient(BloodType::ABPos);
        r.age = Some(50);

        let profile = MatchingPolicy::default();
        assert!(matches!(
            check_eligibility(&d, &r, &profile),
            Err(Exclusion::AgeGapTooWide { gap: 20, limit: 15 })
        ));

        let registry = MatchingPolicy {
            model: ScoringModel::Registry,
            ..MatchingPolicy::default()
        };
        assert!(check_eligibility(&d, &r, &registry).is_ok());

        // Unknown ages pass the ceiling.
        d.age = None;
        assert!(check_eligibility(&d, &r, &profile).is_ok());
    }

    #[test]
    fn outcome_bands_at_thresholds() {
        assert_eq!(OutcomeBand::for_score(100), OutcomeBand::Excellent);
        assert_eq!(OutcomeBand::for_score(90), OutcomeBand::Excellent);
        assert_eq!(OutcomeBand::for_score(89), OutcomeBand::Strong);
        assert_eq!(OutcomeBand::for_score(80), OutcomeBand::Strong);
        assert_eq!(OutcomeBand::for_score(79), OutcomeBand::Good);
        assert_eq!(OutcomeBand::for_score(70), OutcomeBand::Good);
        assert_eq!(OutcomeBand::for_score(69), OutcomeBand::Fair);
        assert_eq!(OutcomeBand::for_score(60), OutcomeBand::Fair);
        assert_eq!(OutcomeBand::for_score(59), OutcomeBand::Poor);
        assert_eq!(OutcomeBand::for_score(0), OutcomeBand::Poor);
    }

    #[test]
    fn outcome_band_labels() {
        assert_eq!(OutcomeBand::Strong.predicted_success(), "High (85-95%)");
        assert_eq!(OutcomeBand::Strong.predicted_complications(), "Low");
        assert_eq!(OutcomeBand::Strong.recommendation(), "Highly recommended");
        assert_eq!(OutcomeBand::Good.predicted_success(), "Good (70-85%)");
        assert_eq!(OutcomeBand::Good.recommendation(), "Recommended");
        assert_eq!(OutcomeBand::Fair.predicted_success(), "Moderate (60-70%)");
        assert_eq!(OutcomeBand::Fair.recommendation(), "Consider");
        assert_eq!(OutcomeBand::Poor.predicted_success(), "Low (<60%)");
        assert_eq!(OutcomeBand::Poor.predicted_complications(), "High");
        assert_eq!(OutcomeBand::Poor.recommendation(), "Not recommended");
    }

    #[test]
    fn scoring_model_parses_and_displays() {
        assert_eq!(
            "profile".parse::<ScoringModel>().unwrap(),
            ScoringModel::Profile
        );
        assert_eq!(
            "Registry".parse::<ScoringModel>().unwrap(),
            ScoringModel::Registry
        );
        assert!("ml".parse::<ScoringModel>().is_err());
        assert_eq!(ScoringModel::Profile.to_string(), "profile");
        assert_eq!(ScoringModel::default(), ScoringModel::Profile);
    }

    #[test]
    fn blood_relation_parses_and_displays() {
        assert_eq!(
            "identical".parse::<BloodRelation>().unwrap(),
            BloodRelation::Identical
        );
        assert_eq!(
            "Compatible".parse::<BloodRelation>().unwrap(),
            BloodRelation::Compatible
        );
        assert!("sibling".parse::<BloodRelation>().is_err());
        assert_eq!(BloodRelation::Incompatible.to_string(), "incompatible");
    }
}
