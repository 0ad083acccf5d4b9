//! Automatic scoring for a completed vote set.
//!
//! For each `(voter, voted answer)` pair: a vote for the correct answer is
//! worth 2 points to the voter; every *other* author of a bluff with that
//! text gains 1 point per voter it fooled. Voting for your own bluff earns
//! nothing. Points only ever go up; there is no cap and no decay.

use crate::aggregate::normalize;
use crate::types::{Answer, Player};
use std::collections::BTreeMap;

/// Points scored by a correct vote.
const CORRECT_VOTE_POINTS: u32 = 2;
/// Points an author gains per voter fooled by their bluff.
const FOOLED_VOTER_POINTS: u32 = 1;

/// Per-player point deltas for one round.
///
/// Correctness is an exact match against `correct_answer` (votes are cast
/// from the displayed texts, of which the correct answer is one). Bluff
/// authorship matches with the aggregator's normalization, so authors of
/// case variants of the same bluff all get credit.
pub fn round_deltas(
    votes: &BTreeMap<String, String>,
    answers: &BTreeMap<String, Answer>,
    correct_answer: Option<&str>,
) -> BTreeMap<String, u32> {
    let mut deltas: BTreeMap<String, u32> = BTreeMap::new();

    for (voter, voted_answer) in votes {
        if correct_answer == Some(voted_answer.as_str()) {
            *deltas.entry(voter.clone()).or_insert(0) += CORRECT_VOTE_POINTS;
        }

        let voted_normalized = normalize(voted_answer);
        for answer in answers.values() {
            if normalize(&answer.answer) == voted_normalized && answer.player != *voter {
                *deltas.entry(answer.player.clone()).or_insert(0) += FOOLED_VOTER_POINTS;
            }
        }
    }

    deltas
}

/// Apply deltas to the `players` map, returning the updated map that is
/// persisted as a single update. Deltas for names without a player entry
/// are dropped.
pub fn apply_deltas(
    players: &BTreeMap<String, Player>,
    deltas: &BTreeMap<String, u32>,
) -> BTreeMap<String, Player> {
    let mut updated = players.clone();
    for (name, delta) in deltas {
        match updated.get_mut(name) {
            Some(player) => player.score += delta,
            None => tracing::warn!(player = %name, "dropping score delta for unknown player"),
        }
    }
    updated
}
