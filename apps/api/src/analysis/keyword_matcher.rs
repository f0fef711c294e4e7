//! Keyword Matcher — fuzzy coverage of job-description tokens by resume tokens.
//!
//! Algorithm:
//! 1. Deduplicate both token collections.
//! 2. For each unique JD token, find the most similar resume token (0–100 scale).
//! 3. A JD token is found iff its best similarity ≥ threshold (default 85).
//! 4. score = found / unique JD tokens × 100; missing tokens are returned sorted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Minimum similarity (0–100) for a JD token to count as present in the resume.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 85.0;

/// String similarity normalized to 0–100.
pub type SimilarityFn = fn(&str, &str) -> f64;

/// Normalized Levenshtein similarity scaled to 0–100.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// A JD token that was found in the resume, with the resume token that covered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub keyword: String,
    pub matched_with: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatchResult {
    /// Coverage of unique JD tokens, 0 – 100.
    pub score: f64,
    /// JD tokens with no sufficiently similar resume token, sorted.
    pub missing_keywords: Vec<String>,
    /// JD tokens that were covered, sorted by keyword.
    pub matched: Vec<KeywordHit>,
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordMatcher {
    threshold: f64,
    similarity: SimilarityFn,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl KeywordMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            similarity: levenshtein_ratio,
        }
    }

    /// Replaces the similarity metric. Used by tests to pin exact-match behavior.
    pub fn with_similarity(mut self, similarity: SimilarityFn) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn match_keywords(&self, resume_tokens: &[String], jd_tokens: &[String]) -> KeywordMatchResult {
        let jd_unique: BTreeSet<&str> = jd_tokens.iter().map(String::as_str).collect();
        let resume_unique: BTreeSet<&str> = resume_tokens.iter().map(String::as_str).collect();

        if jd_unique.is_empty() {
            return KeywordMatchResult {
                score: 0.0,
                missing_keywords: vec![],
                matched: vec![],
            };
        }

        let mut matched = Vec::new();
        let mut missing_keywords = Vec::new();

        for keyword in &jd_unique {
            match self.best_match(keyword, &resume_unique) {
                Some((candidate, similarity)) if similarity >= self.threshold => {
                    matched.push(KeywordHit {
                        keyword: keyword.to_string(),
                        matched_with: candidate.to_string(),
                        similarity,
                    });
                }
                _ => missing_keywords.push(keyword.to_string()),
            }
        }

        let score = matched.len() as f64 * 100.0 / jd_unique.len() as f64;

        KeywordMatchResult {
            score,
            missing_keywords,
            matched,
        }
    }

    /// Highest-scoring resume token for `keyword`. Ties keep the first in sorted order.
    fn best_match<'a>(&self, keyword: &str, resume: &BTreeSet<&'a str>) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for candidate in resume {
            let similarity = (self.similarity)(keyword, candidate);
            if best.map_or(true, |(_, s)| similarity > s) {
                best = Some((*candidate, similarity));
            }
        }
        best
    }
}
