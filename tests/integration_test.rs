use fakeit::aggregate;
use fakeit::config::GameConfig;
use fakeit::error::GameError;
use fakeit::questions::QuestionBank;
use fakeit::session::{LocalState, SessionCoordinator};
use fakeit::store::{paths, GameStore, MemoryStore};
use fakeit::types::{GamePhase, GameRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

fn coordinator(store: &Arc<MemoryStore>) -> SessionCoordinator {
    let config = GameConfig {
        auto_advance_delay: Duration::from_millis(10),
        ..GameConfig::default()
    };
    let questions = Arc::new(QuestionBank::new(vec![(
        "What is the capital of France?".to_string(),
        "Paris".to_string(),
    )]));
    SessionCoordinator::new(store.clone(), config, questions)
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
        rx.changed().await.expect("state channel closed");
    }
}

async fn wait_for_phase(coordinator: &SessionCoordinator, phase: GamePhase) -> GameRecord {
    wait_for(coordinator, |s| {
        s.game.as_ref().is_some_and(|g| g.phase == phase)
    })
    .await
    .game
    .expect("record present")
}

async fn read_record(store: &MemoryStore, code: &str) -> GameRecord {
    let value = store
        .read(&paths::game(code))
        .await
        .expect("read")
        .expect("record exists");
    serde_json::from_value(value).expect("well-formed record")
}

/// End-to-end integration test for a complete round: Ann hosts, Bo joins,
/// both bluff "Lyon", Ann votes the truth, Bo falls for Ann's bluff.
#[tokio::test]
async fn test_full_game_flow() {
    let store = Arc::new(MemoryStore::new());
    let ann = coordinator(&store);
    let bo = coordinator(&store);

    // 1. Setup: Ann creates a game with two guesses per question
    let code = ann
        .create_game("Ann", "🐱", 2)
        .await
        .expect("game created");
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

    let record = read_record(&store, &code).await;
    assert_eq!(record.phase, GamePhase::Lobby);
    assert_eq!(record.max_guesses, 2);

    // 2. Bo joins by code
    bo.join_game(&code, "Bo", "🐶").await.expect("joined");
    wait_for(&ann, |s| {
        s.game.as_ref().is_some_and(|g| g.players.len() == 2)
    })
    .await;
    assert!(ann.can_start_game());

    // 3. Host starts the round and confirms the drawn question
    ann.start_round().await.expect("round started");
    wait_for_phase(&ann, GamePhase::QuestionPreview).await;
    ann.confirm_question().await.expect("question confirmed");

    let record = wait_for_phase(&bo, GamePhase::Question).await;
    assert_eq!(
        record.current_question.as_deref(),
        Some("What is the capital of France?")
    );
    assert_eq!(record.correct_answer.as_deref(), Some("Paris"));

    // 4. The players submit their bluffs; submitting the truth is rejected
    assert!(matches!(
        ann.submit_answer("paris").await,
        Err(GameError::MatchesCorrectAnswer)
    ));
    ann.submit_answer("Lyon").await.expect("attempt 1");
    let state = wait_for(&ann, |s| s.current_guess_count == 1).await;
    assert!(!state.has_answered, "one guess of two is not done yet");

    ann.submit_answer("Marseille").await.expect("attempt 2");
    let state = wait_for(&ann, |s| s.current_guess_count == 2).await;
    assert!(state.has_answered);
    assert!(matches!(
        ann.submit_answer("Nice").await,
        Err(GameError::GuessLimitReached { max: 2 })
    ));

    bo.submit_answer("lyon ").await.expect("bo attempt 1");

    // 5. Everyone has answered at least once, so the host auto-advances
    //    to voting after the configured pause
    let record = wait_for_phase(&bo, GamePhase::Voting).await;

    // The voting screen collapses the case variants of "Lyon" into one
    // displayed option and always includes the correct answer.
    let options = aggregate::voting_options(
        &record.answers,
        record.correct_answer.as_deref().expect("correct answer"),
        &mut StdRng::seed_from_u64(42),
    );
    assert_eq!(options.len(), 3); // Lyon, Marseille, Paris
    assert!(options.contains(&"Lyon".to_string()));
    assert!(options.contains(&"Marseille".to_string()));
    assert!(options.contains(&"Paris".to_string()));

    // 6. Ann votes the truth; Bo votes the shared "Lyon" bluff
    assert!(matches!(
        ann.submit_vote().await,
        Err(GameError::NoVoteSelected)
    ));
    ann.select_answer("Paris");
    ann.submit_vote().await.expect("ann voted");
    bo.select_answer("Lyon");
    bo.submit_vote().await.expect("bo voted");
    wait_for(&ann, |s| {
        s.game.as_ref().is_some_and(|g| g.votes.len() == 2)
    })
    .await;

    // 7. Scoring: Ann +2 for the correct vote, +1 for fooling Bo; Bo voted
    //    a bluff he co-authored, which earns the voter nothing
    ann.proceed_to_results().await.expect("scored");
    let record = wait_for_phase(&bo, GamePhase::Results).await;
    assert_eq!(record.players["Ann"].score, 3);
    assert_eq!(record.players["Bo"].score, 0);

    // 8. Rankings, then the next round clears the table but keeps scores
    ann.proceed_to_rankings().await.expect("rankings");
    wait_for_phase(&ann, GamePhase::Rankings).await;
    ann.next_round().await.expect("next round");

    let record = wait_for_phase(&ann, GamePhase::QuestionPreview).await;
    assert_eq!(record.round, 2);
    assert!(record.answers.is_empty());
    assert!(record.votes.is_empty());
    assert!(record.current_question.is_none());
    assert_eq!(record.players["Ann"].score, 3);

    // 9. Leaving detaches cleanly and is idempotent
    bo.leave().await;
    bo.leave().await;
    assert!(bo.state().game_code.is_none());
    ann.leave().await;
}

/// A guest invoking host-only controls must never move the shared record.
#[tokio::test]
async fn test_guests_cannot_drive_the_game() {
    let store = Arc::new(MemoryStore::new());
    let ann = coordinator(&store);
    let bo = coordinator(&store);

    let code = ann.create_game("Ann", "🐱", 1).await.expect("created");
    bo.join_game(&code, "Bo", "🐶").await.expect("joined");
    wait_for(&bo, |s| s.game.is_some()).await;

    bo.start_round().await.expect("silent no-op");
    bo.proceed_to_voting().await.expect("silent no-op");
    bo.award_points("Bo", 99).await.expect("silent no-op");

    let record = read_record(&store, &code).await;
    assert_eq!(record.phase, GamePhase::Lobby);
    assert_eq!(record.players["Bo"].score, 0);

    // The host, in turn, cannot jump phases out of order.
    wait_for(&ann, |s| {
        s.game.as_ref().is_some_and(|g| g.players.len() == 2)
    })
    .await;
    assert!(matches!(
        ann.proceed_to_results().await,
        Err(GameError::InvalidTransition {
            from: GamePhase::Lobby,
            to: GamePhase::Results,
        })
    ));
    assert_eq!(read_record(&store, &code).await.phase, GamePhase::Lobby);
}
