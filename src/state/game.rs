//! Word-guess engine.
//!
//! One `WordGame` is one player's round: a secret word, the mask of what has
//! been revealed so far, the remaining attempt budget and the letters already
//! tried. The engine knows nothing about lobbies or players.
//!
//! # Status
//!
//! ```text
//!                 guess (hit, mask complete)
//!              ┌─────────────────────────────▶ Won
//! InProgress ──┤
//!              └─────────────────────────────▶ Lost
//!                 guess (miss, attempts == 0)
//! ```
//!
//! `Won` and `Lost` are terminal. The only change after that is the one-time
//! reveal of the full word performed by [`WordGame::is_finished`] on a loss.

use std::collections::BTreeSet;

use crate::config::GameConfig;

/// Character shown for letters not yet revealed.
pub const PLACEHOLDER: char = '_';

/// Round status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Engine errors. None of them mutate the round.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid word: {0}")]
    InvalidWord(String),

    #[error("invalid letter: {0:?}")]
    InvalidLetter(String),

    #[error("letter '{0}' was already guessed")]
    DuplicateGuess(char),

    #[error("round is already finished")]
    Finished,

    #[error("attempt budget must be at least 1")]
    NoAttempts,
}

/// Check a word against the alphabet rule and the configured length policy.
pub fn validate_word(word: &str, config: &GameConfig) -> Result<(), GameError> {
    if word.is_empty() {
        return Err(GameError::InvalidWord("word is empty".into()));
    }
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GameError::InvalidWord(
            "word must contain only english letters".into(),
        ));
    }
    // ASCII only past this point, so byte length is letter count.
    if word.len() < config.min_word_len {
        return Err(GameError::InvalidWord(format!(
            "word must be at least {} letters",
            config.min_word_len
        )));
    }
    if let Some(max) = config.max_word_len {
        if word.len() > max {
            return Err(GameError::InvalidWord(format!(
                "word must be at most {} letters",
                max
            )));
        }
    }
    Ok(())
}

/// Parse a single guessed letter from wire input.
pub fn parse_letter(input: &str) -> Result<char, GameError> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_lowercase()),
        _ => Err(GameError::InvalidLetter(input.to_string())),
    }
}

/// A single word-guessing round.
#[derive(Debug, Clone)]
pub struct WordGame {
    word: String,
    mask: Vec<char>,
    attempts_remaining: u32,
    max_attempts: u32,
    guessed: BTreeSet<char>,
    status: GameStatus,
    /// Set once the full word has been shown after a loss
    answer_revealed: bool,
}

impl WordGame {
    /// Create a round for `word` with `max_attempts` wrong guesses allowed.
    ///
    /// Only the alphabet rule applies here; use [`WordGame::from_config`] to
    /// enforce length policy as well.
    pub fn new(word: &str, max_attempts: u32) -> Result<Self, GameError> {
        validate_word(word, &GameConfig::default())?;
        if max_attempts == 0 {
            return Err(GameError::NoAttempts);
        }

        let word = word.to_ascii_lowercase();
        let mask = vec![PLACEHOLDER; word.len()];
        Ok(Self {
            word,
            mask,
            attempts_remaining: max_attempts,
            max_attempts,
            guessed: BTreeSet::new(),
            status: GameStatus::InProgress,
            answer_revealed: false,
        })
    }

    /// Create a round with the configured attempt budget and word policy.
    pub fn from_config(word: &str, config: &GameConfig) -> Result<Self, GameError> {
        validate_word(word, config)?;
        Self::new(word, config.max_attempts)
    }

    /// Guess a letter.
    ///
    /// Returns whether the guess revealed anything. A repeated letter, a
    /// non-letter, or a guess on a finished round is rejected untouched.
    pub fn guess(&mut self, letter: char) -> Result<bool, GameError> {
        if self.status.is_terminal() {
            return Err(GameError::Finished);
        }
        if !letter.is_ascii_alphabetic() {
            return Err(GameError::InvalidLetter(letter.to_string()));
        }

        let letter = letter.to_ascii_lowercase();
        if !self.guessed.insert(letter) {
            return Err(GameError::DuplicateGuess(letter));
        }

        let mut progressed = false;
        for (slot, c) in self.mask.iter_mut().zip(self.word.chars()) {
            if c == letter {
                *slot = c;
                progressed = true;
            }
        }

        if !progressed {
            self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        }

        self.status = self.compute_status();
        Ok(progressed)
    }

    fn compute_status(&self) -> GameStatus {
        if !self.mask.contains(&PLACEHOLDER) {
            GameStatus::Won
        } else if self.attempts_remaining == 0 {
            GameStatus::Lost
        } else {
            GameStatus::InProgress
        }
    }

    /// Whether the round is over.
    ///
    /// On a lost round the first call reveals the whole word in the mask.
    /// Later calls change nothing.
    pub fn is_finished(&mut self) -> bool {
        match self.status {
            GameStatus::InProgress => false,
            GameStatus::Won => true,
            GameStatus::Lost => {
                if !self.answer_revealed {
                    self.mask = self.word.chars().collect();
                    self.answer_revealed = true;
                }
                true
            }
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The secret word, lowercase. Only show this to the guesser once the
    /// round is over.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Mask as a string, e.g. `"a__le"`.
    pub fn revealed(&self) -> String {
        self.mask.iter().collect()
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Guessed letters in alphabetical order.
    pub fn guessed_letters(&self) -> Vec<char> {
        self.guessed.iter().copied().collect()
    }

    pub fn has_guessed(&self, letter: char) -> bool {
        self.guessed.contains(&letter.to_ascii_lowercase())
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer_revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_game() {
        let game = WordGame::new("Apple", 6).unwrap();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.attempts_remaining(), 6);
        assert_eq!(game.revealed(), "_____");
        assert_eq!(game.word(), "apple");
        assert!(game.guessed_letters().is_empty());
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        assert_eq!(WordGame::new("abc", 0).unwrap_err(), GameError::NoAttempts);
        assert_eq!(
            WordGame::from_config("abc", &GameConfig::default().with_max_attempts(0)).unwrap_err(),
            GameError::NoAttempts
        );

        let game = WordGame::new("abc", 1).unwrap();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.attempts_remaining(), 1);
    }

    #[test]
    fn test_invalid_words() {
        assert!(matches!(WordGame::new("", 6), Err(GameError::InvalidWord(_))));
        assert!(matches!(WordGame::new("ab1", 6), Err(GameError::InvalidWord(_))));
        assert!(matches!(WordGame::new("two words", 6), Err(GameError::InvalidWord(_))));
        assert!(matches!(WordGame::new("café", 6), Err(GameError::InvalidWord(_))));
    }

    #[test]
    fn test_length_policy() {
        let config = GameConfig::default().with_min_word_len(5);
        assert!(matches!(
            WordGame::from_config("plum", &config),
            Err(GameError::InvalidWord(_))
        ));
        assert!(WordGame::from_config("apple", &config).is_ok());

        let config = GameConfig {
            max_word_len: Some(4),
            ..GameConfig::default()
        };
        assert!(WordGame::from_config("apple", &config).is_err());
    }

    #[test]
    fn test_hit_reveals_all_positions() {
        let mut game = WordGame::new("apple", 6).unwrap();
        assert_eq!(game.guess('P'), Ok(true));
        assert_eq!(game.revealed(), "_pp__");
        assert_eq!(game.attempts_remaining(), 6);
    }

    #[test]
    fn test_miss_costs_attempt() {
        let mut game = WordGame::new("apple", 6).unwrap();
        assert_eq!(game.guess('z'), Ok(false));
        assert_eq!(game.attempts_remaining(), 5);
        assert_eq!(game.revealed(), "_____");
    }

    #[test]
    fn test_duplicate_guess_is_rejected() {
        let mut game = WordGame::new("apple", 6).unwrap();
        game.guess('z').unwrap();
        game.guess('a').unwrap();

        // Case-insensitive, no state change
        assert_eq!(game.guess('Z'), Err(GameError::DuplicateGuess('z')));
        assert_eq!(game.guess('a'), Err(GameError::DuplicateGuess('a')));
        assert_eq!(game.attempts_remaining(), 5);
        assert_eq!(game.revealed(), "a____");
    }

    #[test]
    fn test_win() {
        let mut game = WordGame::new("plum", 6).unwrap();
        for c in ['p', 'l', 'u'] {
            game.guess(c).unwrap();
            assert!(!game.is_finished());
        }
        game.guess('m').unwrap();
        assert_eq!(game.status(), GameStatus::Won);
        assert!(game.is_finished());
        assert_eq!(game.revealed(), "plum");
    }

    #[test]
    fn test_loss_reveals_word_once() {
        let mut game = WordGame::new("plum", 3).unwrap();
        game.guess('p').unwrap();
        for c in ['x', 'y', 'z'] {
            game.guess(c).unwrap();
        }

        assert_eq!(game.status(), GameStatus::Lost);
        assert_eq!(game.revealed(), "p___");
        assert!(!game.answer_revealed());

        assert!(game.is_finished());
        assert_eq!(game.revealed(), "plum");
        assert!(game.answer_revealed());

        // Idempotent
        assert!(game.is_finished());
        assert_eq!(game.revealed(), "plum");
        assert_eq!(game.status(), GameStatus::Lost);
        assert_eq!(game.attempts_remaining(), 0);
    }

    #[test]
    fn test_guess_after_finish() {
        let mut game = WordGame::new("a", 6).unwrap();
        game.guess('a').unwrap();
        assert_eq!(game.guess('b'), Err(GameError::Finished));
        assert!(!game.has_guessed('b'));
    }

    #[test]
    fn test_guessed_letters_sorted() {
        let mut game = WordGame::new("apple", 6).unwrap();
        for c in ['q', 'a', 'E', 'c'] {
            game.guess(c).unwrap();
        }
        assert_eq!(game.guessed_letters(), vec!['a', 'c', 'e', 'q']);
    }

    #[test]
    fn test_parse_letter() {
        assert_eq!(parse_letter("A"), Ok('a'));
        assert_eq!(parse_letter(" q "), Ok('q'));
        assert!(parse_letter("").is_err());
        assert!(parse_letter("ab").is_err());
        assert!(parse_letter("1").is_err());
        assert!(parse_letter("é").is_err());
    }

    #[test]
    fn test_invalid_letter_guess() {
        let mut game = WordGame::new("apple", 6).unwrap();
        assert!(matches!(game.guess('3'), Err(GameError::InvalidLetter(_))));
        assert_eq!(game.attempts_remaining(), 6);
    }
}
