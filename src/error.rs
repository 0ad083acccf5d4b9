use crate::types::{GamePhase, MAX_GUESS_LIMIT};
use thiserror::Error;

/// Failure of an underlying store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A patch targeted a path whose current value is not an object.
    #[error("cannot merge fields into non-object value at {0}")]
    NotAnObject(String),

    /// The backend rejected or could not complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("failed to encode or decode stored value: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Everything a game action can fail with. Validation variants carry the
/// short message shown to the acting user; none of them mutate shared state.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("enter your name first")]
    EmptyName,

    #[error("pick an emoji first")]
    NoEmoji,

    #[error("max guesses must be between 1 and {}", MAX_GUESS_LIMIT)]
    InvalidMaxGuesses,

    #[error("game codes are 6 letters or digits")]
    InvalidCode,

    #[error("enter an answer")]
    EmptyAnswer,

    #[error("that's the correct answer, write a bluff instead")]
    MatchesCorrectAnswer,

    #[error("all {max} guesses are used up")]
    GuessLimitReached { max: u32 },

    #[error("select an answer first")]
    NoVoteSelected,

    #[error("no question has been drawn")]
    NoPreviewQuestion,

    #[error("the question bank is empty")]
    EmptyQuestionBank,

    #[error("at least {min} players are needed to start")]
    NotEnoughPlayers { min: usize },

    #[error("no such player: {0}")]
    UnknownPlayer(String),

    #[error("game not found, check the code")]
    GameNotFound,

    #[error("could not allocate a free game code")]
    CodeAllocation,

    #[error("invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    #[error("not connected to a game")]
    NotAttached,

    #[error(transparent)]
    Store(#[from] StoreError),
}
