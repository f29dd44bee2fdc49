//! Closed vocabularies attached to every listing
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a listing on its marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Open for proposals
    #[default]
    Active,

    /// No longer accepting proposals
    Closed,

    /// Visible only to invited freelancers
    Private,
}

impl ListingStatus {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Private => "private",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Where the work is performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Onsite,
    Remote,
    Hybrid,
    #[default]
    Undefined,
}

impl WorkType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Onsite => "onsite",
            Self::Remote => "remote",
            Self::Hybrid => "hybrid",
            Self::Undefined => "undefined",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "onsite" => Some(Self::Onsite),
            "remote" => Some(Self::Remote),
            "hybrid" => Some(Self::Hybrid),
            "undefined" => Some(Self::Undefined),
            _ => None,
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// How the work is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Fixed,
    Monthly,
    Hourly,
}

impl PaymentType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Monthly => "monthly",
            Self::Hourly => "hourly",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "monthly" => Some(Self::Monthly),
            "hourly" => Some(Self::Hourly),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
