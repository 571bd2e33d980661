//! Shared primitive types used across the detection pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A metered account identifier. Stable and unique in the account store.
pub type AccountId = i64;

/// Identifier of one scheduler cycle.
pub type CycleId = String;

/// Manual review marker carried on an account.
///
/// `UnderReview` and `No` keep an account in the violator workflow.
/// Anything else means an inspector already looked at it and cleared it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    UnderReview,
    No,
    Cleared(String),
}

impl ReviewStatus {
    /// An empty or blank marker is kept as `Cleared` with its raw text; it is
    /// neither unset nor in the workflow. Use `is_blank` to spot it.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "under_review" => Self::UnderReview,
            "no"           => Self::No,
            other          => Self::Cleared(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::UnderReview => "under_review",
            Self::No          => "no",
            Self::Cleared(s)  => s.as_str(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReviewStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReviewStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Triage severity of a suspected violator. Red outranks yellow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Red,
    Yellow,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red    => "red",
            Self::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
