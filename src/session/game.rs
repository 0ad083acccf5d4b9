//! Creating and joining games: identity validation, game code generation
//! with collision retry, and the lobby predicate.

use super::SessionCoordinator;
use crate::error::{GameError, StoreError};
use crate::store::paths;
use crate::types::{GameRecord, Player, CODE_CHARS, CODE_LENGTH, MAX_GUESS_LIMIT};
use rand::Rng;

/// Redraw attempts before giving up on finding a free code.
const MAX_CODE_ATTEMPTS: u32 = 16;

/// A fresh random game code, 6 uppercase alphanumeric characters.
pub fn generate_game_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn validate_identity(name: &str, emoji: &str) -> Result<(String, String), GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::EmptyName);
    }
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(GameError::NoEmoji);
    }
    Ok((name.to_string(), emoji.to_string()))
}

fn validate_code(code: &str) -> Result<String, GameError> {
    let code = code.trim().to_uppercase();
    let well_formed = code.len() == CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if well_formed {
        Ok(code)
    } else {
        Err(GameError::InvalidCode)
    }
}

impl SessionCoordinator {
    /// Create a fresh game with this player as host, write the initial
    /// lobby record, and attach to it. Returns the game code.
    pub async fn create_game(
        &self,
        name: &str,
        emoji: &str,
        max_guesses: u32,
    ) -> Result<String, GameError> {
        let (name, emoji) = validate_identity(name, emoji)?;
        if max_guesses == 0 || max_guesses > MAX_GUESS_LIMIT {
            return Err(GameError::InvalidMaxGuesses);
        }

        let code = self.allocate_code().await?;
        let record = GameRecord::new(Player::new(name.clone(), emoji.clone()), max_guesses);
        let value = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store.write(&paths::game(&code), value).await?;

        tracing::info!(code, host = %name, max_guesses, "created game");
        self.attach(&code, &name, &emoji, true).await?;
        Ok(code)
    }

    /// Join an existing game by code and attach to it. Joining under a name
    /// already present overwrites that player entry (last write wins).
    pub async fn join_game(&self, code: &str, name: &str, emoji: &str) -> Result<(), GameError> {
        let (name, emoji) = validate_identity(name, emoji)?;
        let code = validate_code(code)?;

        if self.store.read(&paths::game(&code)).await?.is_none() {
            return Err(GameError::GameNotFound);
        }

        let player = serde_json::to_value(Player::new(name.clone(), emoji.clone()))
            .map_err(StoreError::from)?;
        self.store.write(&paths::player(&code, &name), player).await?;

        tracing::info!(code, player = %name, "joined game");
        self.attach(&code, &name, &emoji, false).await
    }

    /// Whether the lobby has enough players to start.
    pub fn can_start_game(&self) -> bool {
        self.state()
            .game
            .map_or(false, |record| record.players.len() >= self.config.min_players)
    }

    /// Draw codes until one does not resolve to an existing record.
    async fn allocate_code(&self) -> Result<String, GameError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_game_code(&mut *self.code_rng.lock().expect("code rng poisoned"));
            if self.store.read(&paths::game(&code)).await?.is_none() {
                return Ok(code);
            }
            tracing::warn!(code, "game code collision, redrawing");
        }
        Err(GameError::CodeAllocation)
    }
}
