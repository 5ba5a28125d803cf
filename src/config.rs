//! Runtime configuration for lobbies and word games.

use serde::Deserialize;

/// Default number of wrong guesses allowed per round.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Default minimum length of a submitted word.
pub const DEFAULT_MIN_WORD_LEN: usize = 1;

/// Default length of generated lobby ids.
pub const DEFAULT_LOBBY_ID_LEN: usize = 6;

/// Default per-connection outbound buffer (messages).
pub const DEFAULT_OUTBOUND_BUFFER: usize = 32;

/// Game and lobby configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Wrong guesses allowed before a round is lost
    pub max_attempts: u32,

    /// Shortest word a player may submit
    pub min_word_len: usize,

    /// Longest word a player may submit (unbounded if absent)
    pub max_word_len: Option<usize>,

    /// Length of generated lobby ids
    pub lobby_id_len: usize,

    /// Messages buffered per connection before it counts as broken
    pub outbound_buffer: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_word_len: DEFAULT_MIN_WORD_LEN,
            max_word_len: None,
            lobby_id_len: DEFAULT_LOBBY_ID_LEN,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require submitted words to be at least `len` letters.
    pub fn with_min_word_len(mut self, len: usize) -> Self {
        self.min_word_len = len;
        self
    }

    /// Set the attempt budget for every round.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can produce playable lobbies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be positive"));
        }
        if self.lobby_id_len == 0 {
            return Err(ConfigError::Invalid("lobby_id_len must be positive"));
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::Invalid("outbound_buffer must be positive"));
        }
        if let Some(max) = self.max_word_len {
            if max < self.min_word_len.max(1) {
                return Err(ConfigError::Invalid(
                    "max_word_len must not be below min_word_len",
                ));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.max_attempts, 6);
        assert_eq!(config.min_word_len, 1);
        assert_eq!(config.max_word_len, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = GameConfig::from_json_str(r#"{"min_word_len": 5}"#).unwrap();
        assert_eq!(
            config,
            GameConfig {
                min_word_len: 5,
                ..GameConfig::default()
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            GameConfig::from_json_str(r#"{"max_attempts": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameConfig::from_json_str(r#"{"min_word_len": 5, "max_word_len": 3}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
