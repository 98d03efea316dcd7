//! Derived views over the candidate list.
//!
//! All functions here are pure and cheap enough to recompute on every state
//! change.

use std::collections::HashMap;

use confivote_runtime::Address;
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// Aggregate figures for the dashboard header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_candidates: usize,
    /// Sum of `public_value1` over all candidates
    pub total_votes: u64,
    /// `total_votes / total_candidates`, one decimal, 0 when empty
    pub avg_score: f64,
    /// Most frequent category, first seen wins ties
    pub top_category: Option<String>,
}

/// Category dropdown selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Exact(String),
}

impl CategoryFilter {
    /// `"all"` (any case) or an empty string selects everything.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Exact(value.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => category == expected,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute_stats(candidates: &[Candidate]) -> Stats {
    let total_candidates = candidates.len();
    let total_votes: u64 = candidates.iter().map(|c| u64::from(c.public_value1)).sum();
    let avg_score = if total_candidates == 0 {
        0.0
    } else {
        round_one_decimal(total_votes as f64 / total_candidates as f64)
    };

    Stats {
        total_candidates,
        total_votes,
        avg_score,
        top_category: top_category(candidates),
    }
}

fn top_category(candidates: &[Candidate]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for c in candidates {
        let count = counts.entry(c.category.as_str()).or_insert(0);
        if *count == 0 {
            order.push(c.category.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for category in order {
        let count = counts[category];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category.to_string())
}

/// Verified candidates by decrypted value, highest first, at most `limit`.
pub fn rank_verified(candidates: &[Candidate], limit: usize) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> =
        candidates.iter().filter(|c| c.is_verified).cloned().collect();
    ranked.sort_by(|a, b| b.decrypted_value.unwrap_or(0).cmp(&a.decrypted_value.unwrap_or(0)));
    ranked.truncate(limit);
    ranked
}

/// Case-insensitive search on name or category, AND the category filter.
pub fn filter_candidates(
    candidates: &[Candidate],
    search: &str,
    category: &CategoryFilter,
) -> Vec<Candidate> {
    let needle = search.trim().to_lowercase();
    candidates
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.category.to_lowercase().contains(&needle)
        })
        .filter(|c| category.matches(&c.category))
        .cloned()
        .collect()
}

/// Distinct categories in first-seen order.
pub fn categories(candidates: &[Candidate]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for c in candidates {
        if !seen.contains(&c.category) {
            seen.push(c.category.clone());
        }
    }
    seen
}

/// Candidates submitted by `creator`.
pub fn created_by(candidates: &[Candidate], creator: &Address) -> Vec<Candidate> {
    candidates.iter().filter(|c| &c.creator == creator).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use confivote_runtime::RecordId;

    fn candidate(name: &str, category: &str, votes: u32) -> Candidate {
        Candidate {
            record_id: RecordId::new(name),
            name: name.to_string(),
            category: category.to_string(),
            timestamp: 0,
            creator: Address::new([1; 20]),
            public_value1: votes,
            public_value2: 0,
            is_verified: false,
            decrypted_value: None,
        }
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(10.0 / 3.0), 3.3);
        assert_eq!(round_one_decimal(2.25), 2.3);
        assert_eq!(round_one_decimal(0.0), 0.0);
    }

    #[test]
    fn test_top_category_prefers_first_seen_on_tie() {
        let list = vec![
            candidate("a", "Best Actor", 1),
            candidate("b", "Best Film", 1),
            candidate("c", "Best Film", 1),
            candidate("d", "Best Actor", 1),
        ];
        assert_eq!(top_category(&list).as_deref(), Some("Best Actor"));
    }

    #[test]
    fn test_top_category_strict_majority() {
        let list = vec![
            candidate("a", "Best Actor", 1),
            candidate("b", "Best Film", 1),
            candidate("c", "Best Film", 1),
        ];
        assert_eq!(top_category(&list).as_deref(), Some("Best Film"));
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("ALL"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("Best Film"), CategoryFilter::Exact("Best Film".into()));
    }

    #[test]
    fn test_exact_category_is_case_sensitive() {
        let filter = CategoryFilter::Exact("Best Film".into());
        assert!(filter.matches("Best Film"));
        assert!(!filter.matches("best film"));
    }
}
