use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AdjudicationError;
use crate::llm::extract_json;

/// The judge's closed three-way taxonomy.
///
/// MISSING is never a judge outcome: it is decided by the matcher (empty match) alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Matched statements fully discharge the obligation.
    Satisfied,
    /// Obligation covered but a necessary detail (timeframe, role, ...) is absent.
    Partial,
    /// Topically related without actually stating the procedure.
    Weak,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satisfied => "SATISFIED",
            Self::Partial => "PARTIAL",
            Self::Weak => "WEAK",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = AdjudicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match label.as_str() {
            "SATISFIED" | "FULLY_SATISFIED" | "PRESENT" => Ok(Self::Satisfied),
            "PARTIAL" | "PARTIALLY_SATISFIED" => Ok(Self::Partial),
            "WEAK" => Ok(Self::Weak),
            _ => Err(AdjudicationError::UnknownClassification {
                label: s.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub classification: Classification,
    pub justification: String,
}

impl Verdict {
    pub fn new(classification: Classification, justification: impl Into<String>) -> Self {
        Self {
            classification,
            justification: justification.into(),
        }
    }
}

const NO_JUSTIFICATION: &str = "judge gave no justification";

/// Maps a raw model reply onto a [`Verdict`].
///
/// Accepts `{"status": ..., "justification": ...}` (also `classification` / `reason`), possibly
/// wrapped in code fences or prose. Anything that does not map cleanly is an error.
pub fn parse_verdict(reply: &str) -> Result<Verdict, AdjudicationError> {
    let json = extract_json(reply).ok_or_else(|| AdjudicationError::UnparseableResponse {
        reason: format!("no JSON object in reply: {}", preview(reply)),
    })?;

    let value: Value =
        serde_json::from_str(json).map_err(|e| AdjudicationError::UnparseableResponse {
            reason: e.to_string(),
        })?;

    let label = ["status", "classification"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .ok_or_else(|| AdjudicationError::UnparseableResponse {
            reason: "reply has no status field".to_string(),
        })?;
    let classification = label.parse()?;

    let justification = ["justification", "reason"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|j| !j.is_empty())
        .unwrap_or(NO_JUSTIFICATION);

    Ok(Verdict::new(classification, justification))
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
