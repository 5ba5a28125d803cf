//! Players and seats.
//!
//! A lobby has two seats. Seat one is the host who created the lobby, seat two
//! is the guest who joined it. Players are told apart by an opaque
//! [`PlayerId`]; display names may collide.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque player identity handed to the client (e.g. in a cookie).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id supplied by the client. `None` means the caller has no
    /// resolvable identity.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Seat in a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    /// Host
    One,
    /// Guest
    Two,
}

impl Seat {
    pub const ALL: [Seat; 2] = [Seat::One, Seat::Two];

    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Player ordinal as sent on the wire.
    pub fn ordinal(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn is_host(self) -> bool {
        self == Self::One
    }

    pub fn role(self) -> &'static str {
        match self {
            Self::One => "host",
            Self::Two => "guest",
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player{}", self.ordinal())
    }
}

/// A player sitting in a lobby.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Submitted a word for the opponent
    pub ready: bool,

    /// Asked for a rematch since the last round started
    pub wants_restart: bool,

    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            ready: false,
            wants_restart: false,
            joined_at: chrono::Utc::now(),
        }
    }

    /// Forget the submitted word and any rematch request.
    pub fn reset_round(&mut self) {
        self.ready = false;
        self.wants_restart = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats() {
        assert_eq!(Seat::One.opponent(), Seat::Two);
        assert_eq!(Seat::Two.opponent(), Seat::One);
        assert_eq!(Seat::One.ordinal(), "1");
        assert_eq!(Seat::Two.ordinal(), "2");
        assert!(Seat::One.is_host());
        assert_eq!(Seat::Two.role(), "guest");
        assert_eq!(format!("{}", Seat::Two), "player2");
    }

    #[test]
    fn test_player_ids_are_unique() {
        let a = Player::new("Sam");
        let b = Player::new("Sam");
        assert_eq!(a.name, b.name);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_player_id_parse() {
        let id = PlayerId::new();
        assert_eq!(PlayerId::parse(&id.to_string()), Some(id));
        assert_eq!(PlayerId::parse("not-an-id"), None);
        assert_eq!(PlayerId::parse(""), None);
    }

    #[test]
    fn test_player_id_serializes_as_string() {
        let id = PlayerId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!(id.to_string()));
    }

    #[test]
    fn test_reset_round() {
        let mut player = Player::new("Ada");
        player.ready = true;
        player.wants_restart = true;
        player.reset_round();
        assert!(!player.ready);
        assert!(!player.wants_restart);
    }
}
