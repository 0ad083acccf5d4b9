use crate::types::MIN_PLAYERS;
use std::time::Duration;

/// Session-level tunables.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Players needed before the host can start a round.
    pub min_players: usize,
    /// Guess cap preselected in the create-game flow.
    pub default_max_guesses: u32,
    /// Pause between "everyone answered" and the automatic move to voting,
    /// so the host sees the completed answer list for a moment.
    pub auto_advance_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            default_max_guesses: 3,
            auto_advance_delay: Duration::from_millis(1000),
        }
    }
}

impl GameConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Reads FAKEIT_MIN_PLAYERS, FAKEIT_DEFAULT_MAX_GUESSES and
    /// FAKEIT_AUTO_ADVANCE_DELAY_MS.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_players: read_env("FAKEIT_MIN_PLAYERS", defaults.min_players),
            default_max_guesses: read_env(
                "FAKEIT_DEFAULT_MAX_GUESSES",
                defaults.default_max_guesses,
            ),
            auto_advance_delay: Duration::from_millis(read_env(
                "FAKEIT_AUTO_ADVANCE_DELAY_MS",
                defaults.auto_advance_delay.as_millis() as u64,
            )),
        }
    }
}

fn read_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("ignoring unparseable {key}={raw:?}");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_without_env() {
        std::env::remove_var("FAKEIT_MIN_PLAYERS");
        std::env::remove_var("FAKEIT_DEFAULT_MAX_GUESSES");
        std::env::remove_var("FAKEIT_AUTO_ADVANCE_DELAY_MS");

        let config = GameConfig::from_env();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.default_max_guesses, 3);
        assert_eq!(config.auto_advance_delay, Duration::from_millis(1000));
    }

    #[test]
    #[serial]
    fn env_overrides_are_picked_up() {
        std::env::set_var("FAKEIT_MIN_PLAYERS", "3");
        std::env::set_var("FAKEIT_AUTO_ADVANCE_DELAY_MS", "250");

        let config = GameConfig::from_env();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.auto_advance_delay, Duration::from_millis(250));

        std::env::remove_var("FAKEIT_MIN_PLAYERS");
        std::env::remove_var("FAKEIT_AUTO_ADVANCE_DELAY_MS");
    }

    #[test]
    #[serial]
    fn garbage_env_falls_back_to_default() {
        std::env::set_var("FAKEIT_MIN_PLAYERS", "many");
        let config = GameConfig::from_env();
        assert_eq!(config.min_players, 2);
        std::env::remove_var("FAKEIT_MIN_PLAYERS");
    }
}
