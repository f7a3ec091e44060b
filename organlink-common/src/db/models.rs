//! Shared database model types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Review status shared by donors, recipients, hospitals and doctors.
///
/// Every registration starts at `Pending`; an administrator moves it to
/// `Approved` or `Rejected`. Only approved entities participate in
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Pending,
    Approved,
    Rejected,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "pending",
            EntityStatus::Approved => "approved",
            EntityStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(EntityStatus::Pending),
            "approved" => Ok(EntityStatus::Approved),
            "rejected" => Ok(EntityStatus::Rejected),
            _ => Err(Error::InvalidInput(format!("unknown entity status: {}", s))),
        }
    }
}

/// Lifecycle state of a proposed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Completed,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Completed => "completed",
            MatchStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MatchStatus::Pending),
            "completed" => Ok(MatchStatus::Completed),
            "rejected" => Ok(MatchStatus::Rejected),
            _ => Err(Error::InvalidInput(format!("unknown match status: {}", s))),
        }
    }
}

/// Kind of entity an approval decision targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Donor,
    Recipient,
    Hospital,
    Doctor,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Donor => "donor",
            EntityType::Recipient => "recipient",
            EntityType::Hospital => "hospital",
            EntityType::Doctor => "doctor",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" => Ok(EntityType::Donor),
            "recipient" => Ok(EntityType::Recipient),
            "hospital" => Ok(EntityType::Hospital),
            "doctor" => Ok(EntityType::Doctor),
            _ => Err(Error::InvalidInput(format!("unknown entity type: {}", s))),
        }
    }
}

/// Approve/reject verdict recorded in the approvals audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    /// Entity status an entity lands in after this decision.
    pub fn entity_status(&self) -> EntityStatus {
        match self {
            Decision::Approved => EntityStatus::Approved,
            Decision::Rejected => EntityStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            _ => Err(Error::InvalidInput(format!("unknown decision: {}", s))),
        }
    }
}
