//! Boundary to the local player profile (name, emoji, XP, stats). The
//! game core never calls this; the surrounding app records results and XP
//! after a match. All operations are asynchronous and fallible, and are
//! independent of game-record consistency.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// XP needed per level (flat).
const XP_PER_LEVEL: u64 = 500;
/// XP awarded for winning a match, or for just playing one.
const XP_FOR_WIN: u64 = 100;
const XP_FOR_PLAYING: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub name: String,
    pub emoji: String,
    pub level: u32,
    pub xp: u64,
    pub games_played: u32,
    pub games_won: u32,
    pub total_score: u64,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            name: String::new(),
            emoji: "😀".to_string(),
            level: 1,
            xp: 0,
            games_played: 0,
            games_won: 0,
            total_score: 0,
        }
    }
}

/// Fields of [`PlayerData`] the app may overwrite directly.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
}

pub fn level_for_xp(xp: u64) -> u32 {
    (xp / XP_PER_LEVEL) as u32 + 1
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_player_data(&self) -> Result<PlayerData, StoreError>;

    async fn update_player_data(&self, patch: ProfilePatch) -> Result<(), StoreError>;

    /// Add XP and recompute the level. Returns the updated data.
    async fn add_xp(&self, amount: u64) -> Result<PlayerData, StoreError>;

    /// Record the outcome of one match: play/win counters, score total,
    /// and the XP award for winning or participating.
    async fn record_game_result(&self, won: bool, score: u32) -> Result<(), StoreError>;
}

/// Profile kept in process memory; stands in for on-device storage.
#[derive(Default)]
pub struct MemoryProfile {
    data: RwLock<PlayerData>,
}

impl MemoryProfile {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfile {
    async fn get_player_data(&self) -> Result<PlayerData, StoreError> {
        Ok(self.data.read().await.clone())
    }

    async fn update_player_data(&self, patch: ProfilePatch) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if let Some(name) = patch.name {
            data.name = name;
        }
        if let Some(emoji) = patch.emoji {
            data.emoji = emoji;
        }
        Ok(())
    }

    async fn add_xp(&self, amount: u64) -> Result<PlayerData, StoreError> {
        let mut data = self.data.write().await;
        data.xp += amount;
        let new_level = level_for_xp(data.xp);
        if new_level > data.level {
            tracing::info!(level = new_level, "leveled up");
        }
        data.level = new_level;
        Ok(data.clone())
    }

    async fn record_game_result(&self, won: bool, score: u32) -> Result<(), StoreError> {
        {
            let mut data = self.data.write().await;
            data.games_played += 1;
            data.total_score += u64::from(score);
            if won {
                data.games_won += 1;
            }
        }
        self.add_xp(if won { XP_FOR_WIN } else { XP_FOR_PLAYING })
            .await?;
        Ok(())
    }
}
