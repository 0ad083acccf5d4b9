//! Answer and vote submission for the attached player.

use super::SessionCoordinator;
use crate::aggregate::normalize;
use crate::error::{GameError, StoreError};
use crate::store::paths;
use crate::types::Answer;
use serde_json::json;

impl SessionCoordinator {
    /// Submit a bluff answer for the current question.
    ///
    /// Rejected without any state change when the text is empty, matches
    /// the correct answer (case-insensitively), or the guess limit is
    /// already used up. Each submission consumes one guess; the player
    /// counts as done once all guesses are spent.
    pub async fn submit_answer(&self, text: &str) -> Result<(), GameError> {
        let (code, name, record) = self.current()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::EmptyAnswer);
        }
        if let Some(correct) = record.correct_answer.as_deref() {
            if normalize(text) == normalize(correct) {
                return Err(GameError::MatchesCorrectAnswer);
            }
        }

        let used = record.player_guess_count.get(&name).copied().unwrap_or(0);
        if used >= record.max_guesses {
            return Err(GameError::GuessLimitReached {
                max: record.max_guesses,
            });
        }

        let attempt = used + 1;
        let answer = Answer {
            answer: text.to_string(),
            player: name.clone(),
            attempt_number: attempt,
        };
        let value = serde_json::to_value(&answer).map_err(StoreError::from)?;
        self.store
            .write(&paths::answer(&code, &Answer::key(&name, attempt)), value)
            .await?;
        self.store
            .write(&paths::guess_count(&code, &name), json!(attempt))
            .await?;

        tracing::info!(code, player = %name, attempt, "submitted answer");
        Ok(())
    }

    /// Remember which displayed answer the player has picked on the voting
    /// screen. Local only; nothing is written until [`submit_vote`].
    ///
    /// [`submit_vote`]: SessionCoordinator::submit_vote
    pub fn select_answer(&self, text: &str) {
        let text = text.to_string();
        self.local
            .send_modify(|state| state.selected_answer = Some(text));
    }

    /// Write the selected answer as this player's vote.
    pub async fn submit_vote(&self) -> Result<(), GameError> {
        let (code, name, _) = self.current()?;
        let selected = self
            .state()
            .selected_answer
            .ok_or(GameError::NoVoteSelected)?;

        self.store
            .write(&paths::vote(&code, &name), json!(selected))
            .await?;

        tracing::info!(code, player = %name, "submitted vote");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::questions::QuestionBank;
    use crate::session::LocalState;
    use crate::store::{GameStore, MemoryStore};
    use crate::types::{GamePhase, GameRecord};
    use std::sync::Arc;
    use std::time::Duration;

    fn geography_bank() -> QuestionBank {
        QuestionBank::new(vec![(
            "What is the capital of France?".to_string(),
            "Paris".to_string(),
        )])
    }

    fn coordinator(store: &MemoryStore) -> SessionCoordinator {
        let config = GameConfig {
            auto_advance_delay: Duration::from_millis(5),
            ..GameConfig::default()
        };
        SessionCoordinator::new(Arc::new(store.clone()), config, Arc::new(geography_bank()))
    }

    async fn wait_for(
        coordinator: &SessionCoordinator,
        pred: impl Fn(&LocalState) -> bool,
    ) -> LocalState {
        let mut rx = coordinator.watch_state();
        loop {
            let state = rx.borrow_and_update().clone();
            if pred(&state) {
                return state;
            }
            rx.changed().await.unwrap();
        }
    }

    /// Two players attached to a game sitting in the question phase.
    async fn question_phase_game(
        store: &MemoryStore,
    ) -> (SessionCoordinator, SessionCoordinator, String) {
        let ann = coordinator(store);
        let bo = coordinator(store);

        let code = ann.create_game("Ann", "🐱", 2).await.unwrap();
        bo.join_game(&code, "Bo", "🐶").await.unwrap();
        wait_for(&ann, |s| {
            s.game.as_ref().is_some_and(|g| g.players.len() == 2)
        })
        .await;

        ann.start_round().await.unwrap();
        wait_for(&ann, |s| {
            s.game.as_ref().is_some_and(|g| g.phase == GamePhase::QuestionPreview)
        })
        .await;
        ann.confirm_question().await.unwrap();
        for player in [&ann, &bo] {
            wait_for(player, |s| {
                s.game.as_ref().is_some_and(|g| g.correct_answer.is_some())
            })
            .await;
        }
        (ann, bo, code)
    }

    async fn read_record(store: &MemoryStore, code: &str) -> GameRecord {
        let value = store.read(&paths::game(code)).await.unwrap().unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn answers_are_keyed_by_player_and_attempt() {
        let store = MemoryStore::new();
        let (ann, bo, code) = question_phase_game(&store).await;

        ann.submit_answer("Lyon").await.unwrap();
        bo.submit_answer("  Nice ").await.unwrap();

        let record = read_record(&store, &code).await;
        assert_eq!(record.answers["Ann_1"].answer, "Lyon");
        assert_eq!(record.answers["Bo_1"].answer, "Nice"); // trimmed
        assert_eq!(record.player_guess_count["Ann"], 1);
    }

    #[tokio::test]
    async fn empty_and_correct_answers_are_rejected_without_writes() {
        let store = MemoryStore::new();
        let (ann, _bo, code) = question_phase_game(&store).await;

        assert!(matches!(
            ann.submit_answer("   ").await,
            Err(GameError::EmptyAnswer)
        ));
        assert!(matches!(
            ann.submit_answer(" PARIS ").await,
            Err(GameError::MatchesCorrectAnswer)
        ));

        let record = read_record(&store, &code).await;
        assert!(record.answers.is_empty());
        assert!(record.player_guess_count.is_empty());
    }

    #[tokio::test]
    async fn guess_limit_caps_submissions_and_sets_has_answered() {
        let store = MemoryStore::new();
        let (ann, _bo, code) = question_phase_game(&store).await;

        ann.submit_answer("Lyon").await.unwrap();
        let state = wait_for(&ann, |s| s.current_guess_count == 1).await;
        assert!(!state.has_answered); // 1 of 2 guesses

        ann.submit_answer("Nice").await.unwrap();
        let state = wait_for(&ann, |s| s.current_guess_count == 2).await;
        assert!(state.has_answered);

        assert!(matches!(
            ann.submit_answer("Oslo").await,
            Err(GameError::GuessLimitReached { max: 2 })
        ));
        let record = read_record(&store, &code).await;
        assert_eq!(record.answers.len(), 2);
    }

    #[tokio::test]
    async fn voting_requires_a_selection_first() {
        let store = MemoryStore::new();
        let (ann, _bo, code) = question_phase_game(&store).await;

        assert!(matches!(
            ann.submit_vote().await,
            Err(GameError::NoVoteSelected)
        ));

        ann.select_answer("Paris");
        ann.submit_vote().await.unwrap();

        let record = read_record(&store, &code).await;
        assert_eq!(record.votes["Ann"], "Paris");
        let state = wait_for(&ann, |s| s.has_voted).await;
        assert_eq!(state.selected_answer.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn detached_submission_fails() {
        let store = MemoryStore::new();
        let lonely = coordinator(&store);
        assert!(matches!(
            lonely.submit_answer("Lyon").await,
            Err(GameError::NotAttached)
        ));
        assert!(matches!(
            lonely.submit_vote().await,
            Err(GameError::NotAttached)
        ));
    }
}
