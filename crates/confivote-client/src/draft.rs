//! Vote submission form.

use confivote_runtime::{Result, VoteError};
use serde::{Deserialize, Serialize};

/// Form state while the submission modal is open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDraft {
    pub name: String,
    pub category: String,
    /// Score exactly as typed
    pub score: String,
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVote {
    pub name: String,
    pub category: String,
    pub score: u32,
}

impl VoteDraft {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        score: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            score: score.into(),
        }
    }

    /// Whether the submit control should be enabled.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<ValidVote> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(VoteError::invalid_draft("candidate name is required"));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(VoteError::invalid_draft("category is required"));
        }

        let score = self.score.trim();
        if score.is_empty() {
            return Err(VoteError::invalid_draft("score is required"));
        }
        let score = score.parse::<u32>().map_err(|_| {
            VoteError::invalid_draft(format!("score must be a whole number, got '{score}'"))
        })?;

        Ok(ValidVote {
            name: name.to_string(),
            category: category.to_string(),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_draft_is_trimmed() {
        let draft = VoteDraft::new("  Movie A ", "Best Film", " 7 ");
        let vote = draft.validate().unwrap();
        assert_eq!(
            vote,
            ValidVote {
                name: "Movie A".into(),
                category: "Best Film".into(),
                score: 7,
            }
        );
        assert!(draft.is_submittable());
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        assert!(!VoteDraft::new("", "Best Film", "7").is_submittable());
        assert!(!VoteDraft::new("Movie A", "   ", "7").is_submittable());
        assert!(!VoteDraft::new("Movie A", "Best Film", "").is_submittable());
    }

    #[test]
    fn test_non_numeric_score_is_rejected() {
        for score in ["seven", "7.5", "-1", "1e3", "99999999999"] {
            let draft = VoteDraft::new("Movie A", "Best Film", score);
            let err = draft.validate().unwrap_err();
            assert!(matches!(err, VoteError::InvalidDraft(_)), "score {score:?}");
        }
    }

    #[test]
    fn test_error_names_first_missing_field() {
        let err = VoteDraft::default().validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
