//! Deduplication strategy selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the orchestrator collapses duplicate violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Key on `(file, line, code, source)`.
    #[default]
    Exact,
    /// Key on `(file, line)`; collapses multi-source hits at one spot.
    Location,
    /// Key on `(file, category, code prefix)`.
    Similar,
}

impl DedupStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Location => "location",
            Self::Similar => "similar",
        }
    }
}

impl fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "location" => Ok(Self::Location),
            "similar" => Ok(Self::Similar),
            other => Err(format!("unknown dedup strategy '{other}'")),
        }
    }
}
