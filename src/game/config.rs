use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Card;

pub const DEFAULT_HAND_SIZE: u8 = 5;
pub const DEFAULT_OPTION_DISPLAY_LIMIT: usize = 20;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub players: Vec<String>,
    pub seed: u64,
    pub kingdom: Vec<Card>,
    pub hand_size: u8,
    /// How many options a caller-facing option list shows before truncating.
    pub option_display_limit: usize,
    /// Disables the adapter's automatic cleanup step.
    pub manual_cleanup: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: vec!["Player 1".to_string(), "Player 2".to_string()],
            seed: 0,
            kingdom: Card::FIRST_GAME.to_vec(),
            hand_size: DEFAULT_HAND_SIZE,
            option_display_limit: DEFAULT_OPTION_DISPLAY_LIMIT,
            manual_cleanup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("a game needs {min} to {max} players, got {count}")]
    PlayerCount { count: usize, min: usize, max: usize },
    #[error("kingdom lists {card} more than once")]
    DuplicateKingdomCard { card: Card },
    #[error("{card} is a basic card and cannot be a kingdom pile")]
    NotAKingdomCard { card: Card },
    #[error("the kingdom must contain at least one pile")]
    EmptyKingdom,
    #[error("hand size must be at least 1")]
    EmptyHand,
    #[error("invalid config json: {message}")]
    Malformed { message: String },
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_players<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.players = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_kingdom(mut self, kingdom: impl IntoIterator<Item = Card>) -> Self {
        self.kingdom = kingdom.into_iter().collect();
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json).map_err(|err| {
            ConfigError::Malformed {
                message: err.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(ConfigError::PlayerCount {
                count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        if self.hand_size == 0 {
            return Err(ConfigError::EmptyHand);
        }
        if self.kingdom.is_empty() {
            return Err(ConfigError::EmptyKingdom);
        }
        for (i, card) in self.kingdom.iter().enumerate() {
            if !card.is_kingdom() {
                return Err(ConfigError::NotAKingdomCard { card: *card });
            }
            if self.kingdom[..i].contains(card) {
                return Err(ConfigError::DuplicateKingdomCard { card: *card });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default()
            .validate()
            .expect("default config should validate");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{"seed": 9, "players": ["a", "b", "c"]}"#)
            .expect("partial config should parse");
        assert_eq!(config.seed, 9);
        assert_eq!(config.players.len(), 3);
        assert_eq!(config.hand_size, DEFAULT_HAND_SIZE);
        assert_eq!(config.kingdom, Card::FIRST_GAME.to_vec());
    }

    #[test]
    fn rejects_bad_configs() {
        let solo = GameConfig::default().with_players(["only"]);
        assert!(matches!(
            solo.validate(),
            Err(ConfigError::PlayerCount { count: 1, .. })
        ));

        let dup = GameConfig::default().with_kingdom([Card::Smithy, Card::Smithy]);
        assert_eq!(
            dup.validate(),
            Err(ConfigError::DuplicateKingdomCard { card: Card::Smithy })
        );

        let basic = GameConfig::default().with_kingdom([Card::Gold]);
        assert_eq!(
            basic.validate(),
            Err(ConfigError::NotAKingdomCard { card: Card::Gold })
        );

        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
