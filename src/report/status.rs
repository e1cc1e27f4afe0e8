use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adjudication::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingStatus {
    Satisfied,
    Partial,
    Weak,
    Missing,
    /// The run was cancelled before this requirement was checked.
    Cancelled,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satisfied => "SATISFIED",
            Self::Partial => "PARTIAL",
            Self::Weak => "WEAK",
            Self::Missing => "MISSING",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Anything short of SATISFIED is a compliance gap.
    pub fn is_gap(&self) -> bool {
        !matches!(self, Self::Satisfied)
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Classification> for FindingStatus {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Satisfied => Self::Satisfied,
            Classification::Partial => Self::Partial,
            Classification::Weak => Self::Weak,
        }
    }
}

/// Findings per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub satisfied: usize,
    pub partial: usize,
    pub weak: usize,
    pub missing: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: FindingStatus) {
        match status {
            FindingStatus::Satisfied => self.satisfied += 1,
            FindingStatus::Partial => self.partial += 1,
            FindingStatus::Weak => self.weak += 1,
            FindingStatus::Missing => self.missing += 1,
            FindingStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn get(&self, status: FindingStatus) -> usize {
        match status {
            FindingStatus::Satisfied => self.satisfied,
            FindingStatus::Partial => self.partial,
            FindingStatus::Weak => self.weak,
            FindingStatus::Missing => self.missing,
            FindingStatus::Cancelled => self.cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.satisfied + self.partial + self.weak + self.missing + self.cancelled
    }
}

impl<'a> FromIterator<&'a FindingStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a FindingStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.record(*status);
        }
        counts
    }
}
