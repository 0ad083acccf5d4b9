//! The session coordinator: one instance per connected player, bridging
//! local ephemeral state with the shared authoritative game record.
//!
//! Collaborators (store, question bank) are injected at construction and
//! the coordinator owns its local state container; observers watch it via
//! [`SessionCoordinator::watch_state`]. The reaction to a pushed snapshot
//! is the pure function [`apply_snapshot`], run by a spawned listener task.

mod answer;
mod game;
mod host;

use crate::aggregate;
use crate::config::GameConfig;
use crate::error::{GameError, StoreError};
use crate::questions::QuestionBank;
use crate::store::{paths, Canceller, GameStore};
use crate::types::{GamePhase, GameRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything a UI needs that is not part of the shared record, plus the
/// latest snapshot of the record itself.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    pub game_code: Option<String>,
    pub player_name: Option<String>,
    pub player_emoji: Option<String>,
    pub is_host: bool,
    /// Latest pushed snapshot; `None` before the first push or after the
    /// record was deleted.
    pub game: Option<GameRecord>,
    /// True once this player has used up all allowed guesses.
    pub has_answered: bool,
    pub has_voted: bool,
    /// Voting-screen selection, not yet submitted.
    pub selected_answer: Option<String>,
    /// The host's drawn-but-unconfirmed question index.
    pub preview_index: Option<usize>,
    pub current_guess_count: u32,
    /// Question the auto-advance already fired for, so it fires once.
    pub(crate) auto_advanced_for: Option<String>,
}

/// Side effect requested by [`apply_snapshot`], executed by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotEffect {
    /// Every player has answered; schedule the delayed move to voting.
    AdvanceToVoting,
}

/// Fold one pushed snapshot into the previous local state.
///
/// Pure so the per-snapshot behavior is testable without a store: derived
/// flags come from the record, the voting-screen selection and the host's
/// question preview reset when a new question starts, and the auto-advance
/// effect is requested at most once per question and only on the host.
pub fn apply_snapshot(
    prev: &LocalState,
    record: Option<GameRecord>,
) -> (LocalState, Option<SnapshotEffect>) {
    let mut next = prev.clone();
    let Some(record) = record else {
        next.game = None;
        return (next, None);
    };

    let fresh_question = record.phase == GamePhase::Question
        && prev.game.as_ref().map_or(true, |old| {
            old.phase != GamePhase::Question || old.current_question != record.current_question
        });
    if fresh_question {
        next.selected_answer = None;
        next.preview_index = None;
        next.auto_advanced_for = None;
    }

    if let Some(name) = next.player_name.as_deref() {
        next.current_guess_count = record.player_guess_count.get(name).copied().unwrap_or(0);
        next.has_answered = next.current_guess_count >= record.max_guesses;
        next.has_voted = record.votes.contains_key(name);
    }

    let mut effect = None;
    if next.is_host && record.phase == GamePhase::Question && !record.players.is_empty() {
        let answered = aggregate::players_who_answered(&record.answers);
        let all_answered = record.players.keys().all(|name| answered.contains(name));
        if all_answered && next.auto_advanced_for != record.current_question {
            next.auto_advanced_for = record.current_question.clone();
            effect = Some(SnapshotEffect::AdvanceToVoting);
        }
    }

    next.game = Some(record);
    (next, effect)
}

struct Listener {
    canceller: Canceller,
    handle: JoinHandle<()>,
}

/// Per-player session handle. Construct one per client, call
/// [`create_game`](SessionCoordinator::create_game) or
/// [`join_game`](SessionCoordinator::join_game), then drive the game through
/// its operations while watching [`watch_state`](SessionCoordinator::watch_state).
pub struct SessionCoordinator {
    store: Arc<dyn GameStore>,
    config: GameConfig,
    questions: Arc<QuestionBank>,
    local: Arc<watch::Sender<LocalState>>,
    listener: Mutex<Option<Listener>>,
    code_rng: Mutex<StdRng>,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn GameStore>,
        config: GameConfig,
        questions: Arc<QuestionBank>,
    ) -> Self {
        let (tx, _rx) = watch::channel(LocalState::default());
        Self {
            store,
            config,
            questions,
            local: Arc::new(tx),
            listener: Mutex::new(None),
            code_rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seed the game-code generator, making code allocation deterministic.
    pub fn with_code_seed(self, seed: u64) -> Self {
        *self.code_rng.lock().expect("code rng poisoned") = StdRng::seed_from_u64(seed);
        self
    }

    /// Current local state, including the latest record snapshot.
    pub fn state(&self) -> LocalState {
        self.local.borrow().clone()
    }

    /// A watch receiver notified on every local state change.
    pub fn watch_state(&self) -> watch::Receiver<LocalState> {
        self.local.subscribe()
    }

    /// Detach from the current game: stop the listener, release the store
    /// subscription, and clear local state. Idempotent.
    pub async fn leave(&self) {
        let listener = self
            .listener
            .lock()
            .expect("listener slot poisoned")
            .take();
        if let Some(listener) = listener {
            listener.canceller.cancel();
            let _ = listener.handle.await;
            tracing::info!("left game");
        }
        self.local.send_modify(|state| *state = LocalState::default());
    }

    /// Subscribe to a game record and start the listener task that folds
    /// pushed snapshots into local state.
    async fn attach(
        &self,
        code: &str,
        name: &str,
        emoji: &str,
        is_host: bool,
    ) -> Result<(), GameError> {
        self.leave().await;

        let mut subscription = self.store.subscribe(&paths::game(code)).await?;
        let canceller = subscription.canceller();

        self.local.send_modify(|state| {
            *state = LocalState {
                game_code: Some(code.to_string()),
                player_name: Some(name.to_string()),
                player_emoji: Some(emoji.to_string()),
                is_host,
                ..LocalState::default()
            };
        });

        let store = Arc::clone(&self.store);
        let local = Arc::clone(&self.local);
        let code = code.to_string();
        let delay = self.config.auto_advance_delay;
        let handle = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                let record = match snapshot {
                    Some(value) => match serde_json::from_value::<GameRecord>(value) {
                        Ok(record) => Some(record),
                        Err(error) => {
                            tracing::warn!(%error, code, "ignoring malformed game snapshot");
                            continue;
                        }
                    },
                    None => None,
                };

                let mut effect = None;
                local.send_modify(|state| {
                    let (next, eff) = apply_snapshot(state, record);
                    *state = next;
                    effect = eff;
                });

                if effect == Some(SnapshotEffect::AdvanceToVoting) {
                    spawn_auto_advance(Arc::clone(&store), code.clone(), delay);
                }
            }
            tracing::debug!(code, "game listener stopped");
        });

        *self.listener.lock().expect("listener slot poisoned") = Some(Listener {
            canceller,
            handle,
        });
        Ok(())
    }

    /// The attached game's code, this player's name, and the latest record.
    fn current(&self) -> Result<(String, String, GameRecord), GameError> {
        let state = self.state();
        match (state.game_code, state.player_name, state.game) {
            (Some(code), Some(name), Some(record)) => Ok((code, name, record)),
            _ => Err(GameError::NotAttached),
        }
    }
}

/// After the configured pause, move to voting if the record still shows a
/// fully-answered question. The re-read guards against the host having
/// advanced (or skipped) in the meantime.
fn spawn_auto_advance(store: Arc<dyn GameStore>, code: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(error) = advance_if_still_ready(store.as_ref(), &code).await {
            tracing::warn!(%error, code, "auto-advance to voting failed");
        }
    });
}

async fn advance_if_still_ready(store: &dyn GameStore, code: &str) -> Result<(), GameError> {
    let Some(value) = store.read(&paths::game(code)).await? else {
        return Ok(());
    };
    let record: GameRecord = serde_json::from_value(value).map_err(StoreError::from)?;
    if record.phase != GamePhase::Question {
        return Ok(());
    }

    let answered = aggregate::players_who_answered(&record.answers);
    if record.players.keys().all(|name| answered.contains(name)) {
        tracing::info!(code, "all players answered, advancing to voting");
        store
            .patch(&paths::game(code), one_field("phase", phase_value(GamePhase::Voting)?))
            .await?;
    }
    Ok(())
}

fn one_field(key: &str, value: Value) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(key.to_string(), value);
    fields
}

fn phase_value(phase: GamePhase) -> Result<Value, GameError> {
    Ok(serde_json::to_value(phase).map_err(StoreError::from)?)
}
