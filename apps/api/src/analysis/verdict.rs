use std::fmt;

use serde::{Deserialize, Serialize};

/// Suitability tier derived from the final 0 – 100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

pub const HIGH_THRESHOLD: u32 = 75;
pub const MEDIUM_THRESHOLD: u32 = 50;

impl Verdict {
    /// ≥75 → High, ≥50 → Medium, else Low.
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            Verdict::High
        } else if score >= MEDIUM_THRESHOLD {
            Verdict::Medium
        } else {
            Verdict::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::High => "High",
            Verdict::Medium => "Medium",
            Verdict::Low => "Low",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
