//! Views over the raw `answers` and `votes` maps: who has answered, the
//! deduplicated answer list shown on the voting screen, and reverse lookups
//! from an answer text to its authors and voters.

use crate::types::Answer;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Normalize text for duplicate comparison (trim whitespace, lowercase).
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Answers in submission order: by attempt number, then by player name.
fn by_submission_order(answers: &BTreeMap<String, Answer>) -> Vec<&Answer> {
    let mut ordered: Vec<&Answer> = answers.values().collect();
    ordered.sort_by(|a, b| {
        (a.attempt_number, &a.player).cmp(&(b.attempt_number, &b.player))
    });
    ordered
}

/// Distinct names of players with at least one submitted answer.
pub fn players_who_answered(answers: &BTreeMap<String, Answer>) -> BTreeSet<String> {
    answers.values().map(|a| a.player.clone()).collect()
}

/// One representative `Answer` per distinct answer text.
///
/// Texts are compared case- and whitespace-insensitively; the earliest
/// submission wins and its original casing is preserved.
pub fn unique_answers(answers: &BTreeMap<String, Answer>) -> Vec<Answer> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for answer in by_submission_order(answers) {
        if seen.insert(normalize(&answer.answer)) {
            unique.push(answer.clone());
        }
    }
    unique
}

/// Names of all players whose answer matches `text` (normalized), in
/// submission order. Several players can author the same bluff.
pub fn players_for_answer(text: &str, answers: &BTreeMap<String, Answer>) -> Vec<String> {
    let target = normalize(text);
    let mut players = Vec::new();
    for answer in by_submission_order(answers) {
        if normalize(&answer.answer) == target && !players.contains(&answer.player) {
            players.push(answer.player.clone());
        }
    }
    players
}

/// Names of all players who voted for exactly `text`. Votes are cast from
/// a displayed list of texts, so no normalization applies here.
pub fn voters_for_answer(text: &str, votes: &BTreeMap<String, String>) -> Vec<String> {
    votes
        .iter()
        .filter(|(_, voted)| voted.as_str() == text)
        .map(|(voter, _)| voter.clone())
        .collect()
}

/// The texts shown on the voting screen: every unique answer plus the
/// correct one, shuffled with the caller's RNG so tests can seed it.
/// Display order is presentation only and never feeds into scoring.
pub fn voting_options<R: Rng>(
    answers: &BTreeMap<String, Answer>,
    correct_answer: &str,
    rng: &mut R,
) -> Vec<String> {
    let mut options: Vec<String> = unique_answers(answers)
        .into_iter()
        .map(|a| a.answer)
        .collect();
    options.push(correct_answer.to_string());
    options.shuffle(rng);
    options
}
