//! Point-in-time views of a lobby for polling clients and reconnect resync.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::game::GameStatus;
use super::lobby::{LobbyError, Lobby};
use super::lobby_state::LobbyState;
use super::player::{PlayerId, Seat};

/// One seat as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    pub exists: bool,
    pub name: String,
    /// What this player should do next
    pub instruction: String,
    /// What this player's opponent is doing
    pub opp_instruction: String,
    pub ready: bool,
    /// Mask of the word this player is guessing
    pub revealed_word: String,
    pub attempts_left: u32,
    pub guessed_letters: Vec<char>,
    pub restarted: bool,
}

/// Flattened view of both seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySnapshot {
    pub id: String,
    pub state: LobbyState,
    pub seats: [SeatView; 2],
}

impl LobbySnapshot {
    /// Take a snapshot. Secret words only appear once revealed in a mask.
    pub fn capture(lobby: &Lobby) -> Self {
        Self {
            id: lobby.id.clone(),
            state: lobby.state(),
            seats: [seat_view(lobby, Seat::One), seat_view(lobby, Seat::Two)],
        }
    }

    pub fn seat(&self, seat: Seat) -> &SeatView {
        &self.seats[seat.index()]
    }

    /// JSON with `player1Name`, `player2AttemptsLeft`, ... keys.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), json!(self.id));
        obj.insert("state".into(), json!(self.state.as_str()));

        for seat in Seat::ALL {
            let view = self.seat(seat);
            let key = |field: &str| format!("player{}{}", seat.ordinal(), field);
            let letters: Vec<String> = view.guessed_letters.iter().map(|c| c.to_string()).collect();

            obj.insert(key("Exists"), json!(view.exists));
            obj.insert(key("Name"), json!(view.name));
            obj.insert(key("Instruction"), json!(view.instruction));
            obj.insert(key("OppInstruction"), json!(view.opp_instruction));
            obj.insert(key("Ready"), json!(view.ready));
            obj.insert(key("RevealedWord"), json!(view.revealed_word));
            obj.insert(key("AttemptsLeft"), json!(view.attempts_left));
            obj.insert(key("GuessedLetters"), json!(letters));
            obj.insert(key("Restarted"), json!(view.restarted));
        }

        Value::Object(obj)
    }
}

fn seat_view(lobby: &Lobby, seat: Seat) -> SeatView {
    let Some(player) = lobby.player(seat) else {
        return SeatView {
            exists: false,
            name: String::new(),
            instruction: String::new(),
            opp_instruction: String::new(),
            ready: false,
            revealed_word: String::new(),
            attempts_left: lobby.max_attempts(),
            guessed_letters: Vec::new(),
            restarted: false,
        };
    };

    let round = lobby.engines().guessed_by(seat);
    SeatView {
        exists: true,
        name: player.name.clone(),
        instruction: instruction(lobby, seat),
        opp_instruction: opponent_instruction(lobby, seat),
        ready: player.ready,
        revealed_word: round.map(|g| g.revealed()).unwrap_or_default(),
        attempts_left: round.map_or(lobby.max_attempts(), |g| g.attempts_remaining()),
        guessed_letters: round.map(|g| g.guessed_letters()).unwrap_or_default(),
        restarted: player.wants_restart,
    }
}

fn instruction(lobby: &Lobby, seat: Seat) -> String {
    let ready = lobby.player(seat).is_some_and(|p| p.ready);
    let text = if lobby.state().accepts_guesses() {
        match lobby.engines().guessed_by(seat).map(|g| g.status()) {
            Some(GameStatus::InProgress) => "Guess a letter",
            Some(GameStatus::Won) => "You guessed it! Waiting for your opponent to finish",
            Some(GameStatus::Lost) => "Out of attempts. Waiting for your opponent to finish",
            None => "Waiting for the round to start",
        }
    } else if !ready {
        "Enter a word for your opponent to guess"
    } else if !lobby.has_player(seat.opponent()) {
        "Waiting for an opponent to join"
    } else {
        "Waiting for your opponent to choose a word"
    };
    text.to_string()
}

fn opponent_instruction(lobby: &Lobby, seat: Seat) -> String {
    let opponent = seat.opponent();
    let Some(other) = lobby.player(opponent) else {
        return "Waiting for an opponent to join".to_string();
    };

    let text = if lobby.state().accepts_guesses() {
        match lobby.engines().guessed_by(opponent).map(|g| g.status()) {
            Some(GameStatus::InProgress) => "Opponent is guessing your word",
            Some(GameStatus::Won) => "Opponent guessed your word",
            Some(GameStatus::Lost) => "Opponent ran out of attempts",
            None => "Opponent is getting ready",
        }
    } else if other.ready {
        "Opponent has chosen a word"
    } else {
        "Opponent is choosing a word"
    };
    text.to_string()
}

/// A player's place in a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRole {
    pub name: String,
    /// `host` or `guest`
    pub role: &'static str,
    pub opponent: Option<String>,
}

impl PlayerRole {
    pub fn of(lobby: &Lobby, player_id: PlayerId) -> Result<Self, LobbyError> {
        let seat = lobby.require_seat(player_id)?;
        let name = lobby
            .player(seat)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        Ok(Self {
            name,
            role: seat.role(),
            opponent: lobby.player(seat.opponent()).map(|p| p.name.clone()),
        })
    }
}
