//! Host-gated round control: drawing and confirming questions, walking the
//! phase sequence, scoring, and manual point awards.
//!
//! Every operation here validates the phase transition against the latest
//! snapshot before writing anything, so an out-of-order action leaves the
//! record untouched. Calls from a non-host are a logged no-op, matching a
//! UI that never shows these controls to guests.

use super::{one_field, phase_value, SessionCoordinator};
use crate::error::{GameError, StoreError};
use crate::scoring;
use crate::store::paths;
use crate::types::{GamePhase, GameRecord};
use serde_json::{json, Map, Value};

fn require_transition(record: &GameRecord, to: GamePhase) -> Result<(), GameError> {
    if record.phase.can_transition(to) {
        Ok(())
    } else {
        Err(GameError::InvalidTransition {
            from: record.phase,
            to,
        })
    }
}

impl SessionCoordinator {
    /// Leave the lobby and draw the first question for the host to preview.
    pub async fn start_round(&self) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        if record.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers {
                min: self.config.min_players,
            });
        }
        require_transition(&record, GamePhase::QuestionPreview)?;

        self.draw_question()?;
        self.store
            .patch(
                &paths::game(&code),
                one_field("phase", phase_value(GamePhase::QuestionPreview)?),
            )
            .await?;
        tracing::info!(code, "round started");
        Ok(())
    }

    /// Redraw the previewed question without committing it. The record does
    /// not change; only the host's local preview does.
    pub async fn skip_question(&self) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        require_transition(&record, GamePhase::QuestionPreview)?;

        self.draw_question()?;
        tracing::info!(code, "question skipped");
        Ok(())
    }

    /// Commit the previewed question: clear the previous round's answers,
    /// votes and guess counts, publish the question with its correct
    /// answer, and move to the question phase.
    pub async fn confirm_question(&self) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        require_transition(&record, GamePhase::Question)?;

        let index = self.state().preview_index.ok_or(GameError::NoPreviewQuestion)?;
        let (Some(question), Some(correct)) = (
            self.questions.question(index),
            self.questions.correct_answer(index),
        ) else {
            return Err(GameError::NoPreviewQuestion);
        };

        let mut fields = Map::new();
        fields.insert("phase".to_string(), phase_value(GamePhase::Question)?);
        fields.insert("currentQuestion".to_string(), json!(question));
        fields.insert("correctAnswer".to_string(), json!(correct));
        fields.insert("answers".to_string(), Value::Null);
        fields.insert("votes".to_string(), Value::Null);
        fields.insert("playerGuessCount".to_string(), Value::Null);
        self.store.patch(&paths::game(&code), fields).await?;

        tracing::info!(code, question, "question confirmed");
        Ok(())
    }

    pub async fn proceed_to_voting(&self) -> Result<(), GameError> {
        self.set_phase(GamePhase::Voting).await
    }

    /// Score the round, then move to results. The scored `players` map and
    /// the phase land in one patch so no snapshot shows results without
    /// the new scores.
    pub async fn proceed_to_results(&self) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        require_transition(&record, GamePhase::Results)?;

        let deltas = scoring::round_deltas(
            &record.votes,
            &record.answers,
            record.correct_answer.as_deref(),
        );
        let players = scoring::apply_deltas(&record.players, &deltas);

        let mut fields = Map::new();
        fields.insert(
            "players".to_string(),
            serde_json::to_value(&players).map_err(StoreError::from)?,
        );
        fields.insert("phase".to_string(), phase_value(GamePhase::Results)?);
        self.store.patch(&paths::game(&code), fields).await?;

        tracing::info!(code, ?deltas, "round scored");
        Ok(())
    }

    pub async fn proceed_to_manual_scoring(&self) -> Result<(), GameError> {
        self.set_phase(GamePhase::ManualScoring).await
    }

    pub async fn proceed_to_rankings(&self) -> Result<(), GameError> {
        self.set_phase(GamePhase::Rankings).await
    }

    /// Bump the round counter, clear the finished round's question state,
    /// and return to the question preview with a freshly drawn question.
    pub async fn next_round(&self) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        require_transition(&record, GamePhase::QuestionPreview)?;

        self.draw_question()?;
        let mut fields = Map::new();
        fields.insert("phase".to_string(), phase_value(GamePhase::QuestionPreview)?);
        fields.insert("round".to_string(), json!(record.round + 1));
        fields.insert("currentQuestion".to_string(), Value::Null);
        fields.insert("correctAnswer".to_string(), Value::Null);
        fields.insert("answers".to_string(), Value::Null);
        fields.insert("votes".to_string(), Value::Null);
        fields.insert("playerGuessCount".to_string(), Value::Null);
        self.store.patch(&paths::game(&code), fields).await?;

        tracing::info!(code, round = record.round + 1, "next round");
        Ok(())
    }

    /// Grant bonus points directly to one player, outside the automatic
    /// scoring. Used during the manual scoring phase.
    pub async fn award_points(&self, player: &str, points: u32) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        let Some(entry) = record.players.get(player) else {
            return Err(GameError::UnknownPlayer(player.to_string()));
        };

        self.store
            .patch(
                &paths::player(&code, player),
                one_field("score", json!(entry.score + points)),
            )
            .await?;
        tracing::info!(code, player, points, "awarded manual points");
        Ok(())
    }

    /// The attached game when this player is its host; `None` (after a
    /// warning) when a guest tries a host-only action.
    fn host_context(&self) -> Result<Option<(String, GameRecord)>, GameError> {
        let state = self.state();
        let (Some(code), Some(record)) = (state.game_code, state.game) else {
            return Err(GameError::NotAttached);
        };
        if !state.is_host {
            tracing::warn!(code, "ignoring host-only action from a non-host");
            return Ok(None);
        }
        Ok(Some((code, record)))
    }

    async fn set_phase(&self, to: GamePhase) -> Result<(), GameError> {
        let Some((code, record)) = self.host_context()? else {
            return Ok(());
        };
        require_transition(&record, to)?;

        self.store
            .patch(&paths::game(&code), one_field("phase", phase_value(to)?))
            .await?;
        tracing::info!(code, from = ?record.phase, ?to, "phase advanced");
        Ok(())
    }

    fn draw_question(&self) -> Result<(), GameError> {
        let index = self
            .questions
            .random_index()
            .ok_or(GameError::EmptyQuestionBank)?;
        self.local
            .send_modify(|state| state.preview_index = Some(index));
        Ok(())
    }
}
