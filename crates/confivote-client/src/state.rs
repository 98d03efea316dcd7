//! Application state owned by the controller.

use confivote_runtime::RecordId;
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::draft::VoteDraft;
use crate::views::CategoryFilter;

/// Everything a front-end needs to render, minus the notification banner
///
/// Only changed through the transition methods below, which keep the modal and
/// selection consistent with the cached list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub candidates: Vec<Candidate>,
    /// Submission modal is open iff this is `Some`
    pub draft: Option<VoteDraft>,
    pub search_term: String,
    pub category_filter: CategoryFilter,
    /// Candidate whose detail panel is open
    pub selected: Option<RecordId>,
    /// First load in progress
    pub loading: bool,
    /// Reload in progress
    pub refreshing: bool,
    pub fhe_initializing: bool,
    pub fhe_ready: bool,
    pub submitting: bool,
    /// Record whose score is being decrypted
    pub decrypting: Option<RecordId>,
}

impl AppState {
    pub fn open_vote_modal(&mut self) {
        if self.draft.is_none() {
            self.draft = Some(VoteDraft::default());
        }
    }

    /// Discards the draft.
    pub fn close_vote_modal(&mut self) {
        self.draft = None;
    }

    pub fn is_vote_modal_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.name = name.into();
        }
    }

    pub fn set_draft_category(&mut self, category: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.category = category.into();
        }
    }

    pub fn set_draft_score(&mut self, score: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.score = score.into();
        }
    }

    /// Submit control state: modal open, valid draft and nothing in flight.
    pub fn can_submit(&self) -> bool {
        !self.submitting && self.draft.as_ref().is_some_and(VoteDraft::is_submittable)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.category_filter = filter;
    }

    pub fn select_candidate(&mut self, id: RecordId) {
        self.selected = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        let id = self.selected.as_ref()?;
        self.candidate(id)
    }

    pub fn candidate(&self, id: &RecordId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.record_id == id)
    }

    /// Swaps in a freshly loaded list, dropping a selection that no longer exists.
    pub fn replace_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        if let Some(id) = self.selected.clone() {
            if self.candidate(&id).is_none() {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confivote_runtime::Address;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            record_id: RecordId::new(id),
            name: id.to_string(),
            category: "Best Film".into(),
            timestamp: 0,
            creator: Address::new([0; 20]),
            public_value1: 0,
            public_value2: 0,
            is_verified: false,
            decrypted_value: None,
        }
    }

    #[test]
    fn test_draft_edits_require_open_modal() {
        let mut state = AppState::default();
        state.set_draft_name("ignored");
        assert!(state.draft.is_none());

        state.open_vote_modal();
        state.set_draft_name("Movie A");
        state.set_draft_category("Best Film");
        state.set_draft_score("8");
        assert!(state.can_submit());

        state.close_vote_modal();
        assert!(!state.is_vote_modal_open());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_reopening_keeps_draft() {
        let mut state = AppState::default();
        state.open_vote_modal();
        state.set_draft_name("Movie A");
        state.open_vote_modal();
        assert_eq!(state.draft.as_ref().map(|d| d.name.as_str()), Some("Movie A"));
    }

    #[test]
    fn test_submit_disabled_while_submitting() {
        let mut state = AppState::default();
        state.open_vote_modal();
        state.set_draft_name("Movie A");
        state.set_draft_category("Best Film");
        state.set_draft_score("8");
        state.submitting = true;
        assert!(!state.can_submit());
    }

    #[test]
    fn test_replace_candidates_drops_stale_selection() {
        let mut state = AppState::default();
        state.replace_candidates(vec![candidate("a"), candidate("b")]);
        state.select_candidate(RecordId::new("b"));
        assert_eq!(state.selected_candidate().map(|c| c.name.as_str()), Some("b"));

        state.replace_candidates(vec![candidate("a")]);
        assert!(state.selected.is_none());
    }
}
