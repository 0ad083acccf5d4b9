//! The phase state machine for a shared game record.
//!
//! Phases only move forward through the round sequence, with two loops:
//! `questionPreview -> questionPreview` (the host redraws an unsuitable
//! question) and `rankings -> questionPreview` (next round).

use crate::types::GamePhase;

impl GamePhase {
    /// Check whether a transition is allowed.
    ///
    /// All preconditions beyond the shape of the graph (host-only gating,
    /// the minimum player count for leaving the lobby) are enforced by the
    /// session operations that drive the transition.
    pub fn can_transition(self, to: GamePhase) -> bool {
        use GamePhase::*;

        matches!(
            (self, to),
            (Lobby, QuestionPreview)
                // Redraw without committing; no phase change on the record
                | (QuestionPreview, QuestionPreview)
                | (QuestionPreview, Question)
                | (Question, Voting)
                | (Voting, Results)
                // Results either detours through manual scoring or goes
                // straight to the rankings
                | (Results, ManualScoring)
                | (ManualScoring, Rankings)
                | (Results, Rankings)
                // Next round
                | (Rankings, QuestionPreview)
        )
    }
}
