//! ABO/Rh blood group compatibility
//!
//! Donation compatibility is directional: O- donates to every group while
//! AB+ only donates to itself. `can_donate_to` encodes the standard table
//! used by the eligibility pre-filter and the scoring blood term.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// ABO blood group plus Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O-")]
    ONeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "AB-")]
    ABNeg,
    #[serde(rename = "AB+")]
    ABPos,
}

impl BloodType {
    /// All eight groups, in antigen order.
    pub const ALL: [BloodType; 8] = [
        BloodType::ONeg,
        BloodType::OPos,
        BloodType::ANeg,
        BloodType::APos,
        BloodType::BNeg,
        BloodType::BPos,
        BloodType::ABNeg,
        BloodType::ABPos,
    ];

    /// Whether a donor of this group can donate to a recipient of `other`.
    pub fn can_donate_to(&self, other: BloodType) -> bool {
        use BloodType::*;
        match self {
            ONeg => true,
            OPos => matches!(other, OPos | APos | BPos | ABPos),
            ANeg => matches!(other, ANeg | APos | ABNeg | ABPos),
            APos => matches!(other, APos | ABPos),
            BNeg => matches!(other, BNeg | BPos | ABNeg | ABPos),
            BPos => matches!(other, BPos | ABPos),
            ABNeg => matches!(other, ABNeg | ABPos),
            ABPos => other == ABPos,
        }
    }

    /// Canonical label, e.g. `"O-"` or `"AB+"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::ONeg => "O-",
            BloodType::OPos => "O+",
            BloodType::ANeg => "A-",
            BloodType::APos => "A+",
            BloodType::BNeg => "B-",
            BloodType::BPos => "B+",
            BloodType::ABNeg => "AB-",
            BloodType::ABPos => "AB+",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = Error;

    /// Parses labels like `"O-"`, `"ab+"` or `"AB +"` (case and inner
    /// whitespace insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "O-" => Ok(BloodType::ONeg),
            "O+" => Ok(BloodType::OPos),
            "A-" => Ok(BloodType::ANeg),
            "A+" => Ok(BloodType::APos),
            "B-" => Ok(BloodType::BNeg),
            "B+" => Ok(BloodType::BPos),
            "AB-" => Ok(BloodType::ABNeg),
            "AB+" => Ok(BloodType::ABPos),
            _ => Err(Error::InvalidInput(format!("unknown blood type: {}", s))),
        }
    }
}
