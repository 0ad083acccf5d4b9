use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fakeit::config::GameConfig;
use fakeit::error::GameError;
use fakeit::profile::{MemoryProfile, ProfileStore};
use fakeit::questions::QuestionBank;
use fakeit::session::SessionCoordinator;
use fakeit::store::MemoryStore;
use fakeit::types::GamePhase;

/// Plays one scripted round between two local players against the
/// in-memory store, logging every state change along the way.
#[tokio::main]
async fn main() -> Result<(), GameError> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fakeit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fake It demo round...");

    let store = Arc::new(MemoryStore::new());
    let config = GameConfig::from_env();
    let questions = Arc::new(QuestionBank::builtin());

    let ann = SessionCoordinator::new(store.clone(), config.clone(), questions.clone());
    let bo = SessionCoordinator::new(store.clone(), config.clone(), questions.clone());

    let code = ann.create_game("Ann", "🐱", 1).await?;
    tracing::info!(code, "game created, share this code");
    bo.join_game(&code, "Bo", "🐶").await?;
    wait_for_players(&ann, 2).await;

    ann.start_round().await?;
    wait_for_phase(&ann, GamePhase::QuestionPreview).await;
    ann.confirm_question().await?;
    wait_for_phase(&bo, GamePhase::Question).await;

    let question = ann
        .state()
        .game
        .and_then(|g| g.current_question)
        .unwrap_or_default();
    tracing::info!(question, "question is live");

    ann.submit_answer("a plausible bluff").await?;
    bo.submit_answer("an even better bluff").await?;

    // All players answered; the host auto-advances after the pause.
    wait_for_phase(&ann, GamePhase::Voting).await;
    wait_for_phase(&bo, GamePhase::Voting).await;

    let correct = ann
        .state()
        .game
        .and_then(|g| g.correct_answer)
        .unwrap_or_default();
    ann.select_answer(&correct);
    ann.submit_vote().await?;
    bo.select_answer("a plausible bluff");
    bo.submit_vote().await?;
    wait_for_votes(&ann, 2).await;

    ann.proceed_to_results().await?;
    let results = wait_for_phase(&ann, GamePhase::Results).await;
    for (name, player) in &results.players {
        tracing::info!(player = %name, score = player.score, "round result");
    }

    ann.proceed_to_rankings().await?;
    wait_for_phase(&ann, GamePhase::Rankings).await;

    // The surrounding app records the outcome on each player's profile.
    let winner = results
        .players
        .values()
        .max_by_key(|p| p.score)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    for (name, player) in &results.players {
        let profile = MemoryProfile::new();
        profile
            .update_player_data(fakeit::profile::ProfilePatch {
                name: Some(name.clone()),
                emoji: Some(player.emoji.clone()),
            })
            .await?;
        profile
            .record_game_result(*name == winner, player.score)
            .await?;
        let data = profile.get_player_data().await?;
        tracing::info!(player = %name, xp = data.xp, level = data.level, "profile updated");
    }

    ann.leave().await;
    bo.leave().await;
    tracing::info!("demo round finished");
    Ok(())
}

async fn wait_for_players(coordinator: &SessionCoordinator, count: usize) {
    wait(coordinator, |g| g.players.len() >= count).await;
}

async fn wait_for_votes(coordinator: &SessionCoordinator, count: usize) {
    wait(coordinator, |g| g.votes.len() >= count).await;
}

async fn wait_for_phase(
    coordinator: &SessionCoordinator,
    phase: GamePhase,
) -> fakeit::types::GameRecord {
    wait(coordinator, |g| g.phase == phase).await
}

async fn wait(
    coordinator: &SessionCoordinator,
    pred: impl Fn(&fakeit::types::GameRecord) -> bool,
) -> fakeit::types::GameRecord {
    let mut rx = coordinator.watch_state();
    loop {
        if let Some(game) = rx.borrow_and_update().game.clone() {
            if pred(&game) {
                return game;
            }
        }
        if rx.changed().await.is_err() {
            tracing::error!("state channel closed while waiting");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}
