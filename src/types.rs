use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of players required to start a round.
pub const MIN_PLAYERS: usize = 2;

/// Upper bound for the per-round guess cap chosen at game creation.
pub const MAX_GUESS_LIMIT: u32 = 5;

/// Game codes are 6 uppercase alphanumeric characters.
pub const CODE_LENGTH: usize = 6;
pub const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The authoritative stage a shared game record is in.
///
/// Serialized with the camelCase names the records use on the wire
/// (`"questionPreview"` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Lobby,
    QuestionPreview,
    Question,
    Voting,
    Results,
    ManualScoring,
    Rankings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub emoji: String,
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
            score: 0,
        }
    }
}

/// One bluff submission. Keyed in the record by `"{player}_{attempt}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer: String,
    pub player: String,
    pub attempt_number: u32,
}

impl Answer {
    /// Composite key for the `answers` map.
    pub fn key(player: &str, attempt_number: u32) -> String {
        format!("{player}_{attempt_number}")
    }
}

/// The shared game record, one per active game code.
///
/// The map fields default to empty on deserialization because a realtime
/// backend may drop empty objects entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub host: String,
    pub phase: GamePhase,
    #[serde(default)]
    pub players: BTreeMap<String, Player>,
    pub round: u32,
    pub max_guesses: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
    #[serde(default)]
    pub votes: BTreeMap<String, String>,
    #[serde(default)]
    pub player_guess_count: BTreeMap<String, u32>,
    /// Creation time in epoch milliseconds. Informational only.
    pub created: i64,
}

impl GameRecord {
    /// Fresh record as written by `create_game`: lobby phase, round 1,
    /// the host as the only player.
    pub fn new(host: Player, max_guesses: u32) -> Self {
        let mut players = BTreeMap::new();
        players.insert(host.name.clone(), host.clone());
        Self {
            host: host.name,
            phase: GamePhase::Lobby,
            players,
            round: 1,
            max_guesses,
            current_question: None,
            correct_answer: None,
            answers: BTreeMap::new(),
            votes: BTreeMap::new(),
            player_guess_count: BTreeMap::new(),
            created: chrono::Utc::now().timestamp_millis(),
        }
    }
}
