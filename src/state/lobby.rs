//! Lobby state management.
//!
//! A lobby pairs two players. Each one submits a secret word, and each one
//! guesses the word the *other* submitted, so a lobby holds two independent
//! [`WordGame`]s plus the live connections attached to it.
//!
//! Lobbies live in the [`LobbyManager`] registry and are shared as
//! `Arc<Mutex<Lobby>>`. The registry lock only guards the map; everything
//! inside a lobby is serialized by that lobby's own lock. Take the registry
//! lock first or not at all: never while holding a lobby lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::config::GameConfig;

use super::connection::{ConnectionId, ConnectionSet};
use super::game::{GameError, WordGame};
use super::lobby_state::{InvalidTransition, LobbyEvent, LobbyState};
use super::player::{Player, PlayerId, Seat};

/// Characters used in generated lobby ids.
const LOBBY_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A lobby handle shared between the registry and its callers.
pub type SharedLobby = Arc<Mutex<Lobby>>;

/// The two rounds of a lobby, keyed by who is *guessing*.
///
/// The round player one guesses holds the word player two authored, and the
/// other way round. Always go through [`Engines::install_authored`] and
/// [`Engines::guessed_by`] instead of indexing by seat directly.
#[derive(Debug, Clone, Default)]
pub struct Engines {
    by_guesser: [Option<WordGame>; 2],
}

impl Engines {
    /// Store a word `author` chose; it becomes the opponent's round.
    pub fn install_authored(&mut self, author: Seat, game: WordGame) {
        self.by_guesser[author.opponent().index()] = Some(game);
    }

    /// The round `guesser` is playing.
    pub fn guessed_by(&self, guesser: Seat) -> Option<&WordGame> {
        self.by_guesser[guesser.index()].as_ref()
    }

    pub fn guessed_by_mut(&mut self, guesser: Seat) -> Option<&mut WordGame> {
        self.by_guesser[guesser.index()].as_mut()
    }

    /// The round built from the word `author` chose.
    pub fn authored_by(&self, author: Seat) -> Option<&WordGame> {
        self.guessed_by(author.opponent())
    }

    pub fn clear(&mut self) {
        self.by_guesser = [None, None];
    }
}

/// Public, secret-free view of a lobby for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbySummary {
    pub id: String,
    pub name: String,
    pub host: Option<String>,
    pub players: usize,
    pub state: &'static str,
    pub joinable: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lobby state.
#[derive(Debug)]
pub struct Lobby {
    /// Short shareable id
    pub id: String,

    /// Display name
    pub name: String,

    seats: [Option<Player>; 2],

    engines: Engines,

    state: LobbyState,

    connections: ConnectionSet,

    /// Attempt budget new rounds start with
    max_attempts: u32,

    /// Set once the lobby has been torn down
    closed: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Lobby {
    /// Create a lobby with `host` in seat one.
    pub fn new(id: String, host: Player, max_attempts: u32) -> Self {
        let name = format!("{}'s lobby", host.name);
        Self {
            id,
            name,
            seats: [Some(host), None],
            engines: Engines::default(),
            state: LobbyState::Waiting,
            connections: ConnectionSet::new(),
            max_attempts,
            closed: false,
            created_at: chrono::Utc::now(),
        }
    }

    /// Seat a new player: seat one if empty, otherwise seat two.
    pub fn add_player(&mut self, player: Player) -> Result<Seat, LobbyError> {
        if self.closed {
            return Err(LobbyError::NotFound(self.id.clone()));
        }

        let seat = if self.seats[Seat::One.index()].is_none() {
            Seat::One
        } else if self.seats[Seat::Two.index()].is_none() {
            if self.state != LobbyState::Waiting {
                return Err(LobbyError::Busy);
            }
            Seat::Two
        } else {
            return Err(LobbyError::Full);
        };

        self.seats[seat.index()] = Some(player);
        Ok(seat)
    }

    /// Seat a newcomer called `name`, falling back to "Player N" for a blank
    /// name.
    pub fn join(&mut self, name: &str) -> Result<(Seat, PlayerId), LobbyError> {
        let next = if self.has_player(Seat::One) {
            Seat::Two
        } else {
            Seat::One
        };
        let player = Player::new(display_name(name, next));
        let player_id = player.id;
        Ok((self.add_player(player)?, player_id))
    }

    /// Empty a seat.
    pub fn remove_player(&mut self, seat: Seat) -> Option<Player> {
        self.seats[seat.index()].take()
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.seats[seat.index()].as_ref()
    }

    pub fn player_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.seats[seat.index()].as_mut()
    }

    /// Seat of a player, if they are in this lobby.
    pub fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.player(*seat).is_some_and(|p| p.id == player_id))
    }

    /// Seat of a player, or `IdentityMissing`.
    pub fn require_seat(&self, player_id: PlayerId) -> Result<Seat, LobbyError> {
        self.seat_of(player_id).ok_or(LobbyError::IdentityMissing)
    }

    pub fn has_player(&self, seat: Seat) -> bool {
        self.player(seat).is_some()
    }

    pub fn players(&self) -> impl Iterator<Item = (Seat, &Player)> {
        Seat::ALL
            .into_iter()
            .filter_map(move |seat| self.player(seat).map(|p| (seat, p)))
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.player_count() == self.seats.len()
    }

    /// Both seats taken and both words submitted.
    pub fn both_ready(&self) -> bool {
        self.seats.iter().all(|s| s.as_ref().is_some_and(|p| p.ready))
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    /// Run the lobby state machine.
    pub fn transition(&mut self, event: LobbyEvent) -> Result<LobbyState, InvalidTransition> {
        self.state.apply_mut(event)?;
        Ok(self.state)
    }

    pub fn engines(&self) -> &Engines {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut Engines {
        &mut self.engines
    }

    /// Drop both rounds and every player's readiness.
    pub fn reset_round(&mut self) {
        self.engines.clear();
        for player in self.seats.iter_mut().flatten() {
            player.reset_round();
        }
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionSet {
        &mut self.connections
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the lobby dead and detach every connection.
    ///
    /// Returns the handles that were attached so the caller can forget them.
    pub fn close(&mut self) -> Vec<ConnectionId> {
        self.closed = true;
        self.connections.drain()
    }

    /// Listing entry. Never includes words.
    pub fn summary(&self) -> LobbySummary {
        LobbySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            host: self.player(Seat::One).map(|p| p.name.clone()),
            players: self.player_count(),
            state: self.state.as_str(),
            joinable: !self.closed && !self.is_full() && self.state == LobbyState::Waiting,
            created_at: self.created_at,
        }
    }
}

/// Lobby errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("lobby {0} not found")]
    NotFound(String),

    #[error("lobby is full")]
    Full,

    #[error("lobby is busy; a round is under way")]
    Busy,

    #[error("player is not identified in this lobby")]
    IdentityMissing,

    #[error("round has not started")]
    NotStarted,

    #[error("a round is in progress")]
    GameInProgress,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl LobbyError {
    /// HTTP status the request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::IdentityMissing => 401,
            _ => 400,
        }
    }
}

/// Lobby registry - tracks all live lobbies.
#[derive(Debug, Default)]
pub struct LobbyManager {
    lobbies: Mutex<HashMap<String, SharedLobby>>,
    config: GameConfig,
}

impl LobbyManager {
    pub fn new(config: GameConfig) -> Self {
        Self {
            lobbies: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Open a lobby hosted by `host_name`.
    ///
    /// Returns the lobby and the host's freshly minted id.
    pub fn create(&self, host_name: &str) -> (SharedLobby, PlayerId) {
        let host = Player::new(display_name(host_name, Seat::One));
        let host_id = host.id;

        let mut lobbies = self.lobbies.lock();
        let id = loop {
            let candidate = generate_lobby_id(self.config.lobby_id_len);
            if !lobbies.contains_key(&candidate) {
                break candidate;
            }
        };

        let lobby = Arc::new(Mutex::new(Lobby::new(
            id.clone(),
            host,
            self.config.max_attempts,
        )));
        lobbies.insert(id.clone(), Arc::clone(&lobby));
        drop(lobbies);

        info!(lobby_id = %id, host = %host_id, "lobby created");
        (lobby, host_id)
    }

    /// Seat `player_name` in an existing lobby.
    pub fn join(&self, lobby_id: &str, player_name: &str) -> Result<(SharedLobby, PlayerId), LobbyError> {
        let shared = self.get(lobby_id)?;

        let (seat, player_id) = shared.lock().join(player_name)?;

        info!(lobby_id, player = %player_id, %seat, "player joined lobby");
        Ok((shared, player_id))
    }

    /// Look up a lobby.
    pub fn get(&self, lobby_id: &str) -> Result<SharedLobby, LobbyError> {
        self.lobbies
            .lock()
            .get(lobby_id)
            .cloned()
            .ok_or_else(|| LobbyError::NotFound(lobby_id.to_string()))
    }

    /// Remove a lobby. Later lookups fail.
    pub fn delete(&self, lobby_id: &str) -> Option<SharedLobby> {
        let removed = self.lobbies.lock().remove(lobby_id);
        if removed.is_some() {
            info!(lobby_id, "lobby deleted");
        }
        removed
    }

    /// Snapshot of every live lobby.
    pub fn list(&self) -> Vec<LobbySummary> {
        let handles: Vec<SharedLobby> = self.lobbies.lock().values().cloned().collect();
        let mut summaries: Vec<LobbySummary> = handles
            .iter()
            .map(|lobby| lobby.lock().summary())
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Remove every lobby, returning the handles.
    pub fn drain(&self) -> Vec<SharedLobby> {
        self.lobbies.lock().drain().map(|(_, lobby)| lobby).collect()
    }

    pub fn count(&self) -> usize {
        self.lobbies.lock().len()
    }

    pub fn lobby_ids(&self) -> Vec<String> {
        self.lobbies.lock().keys().cloned().collect()
    }
}

fn generate_lobby_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len.max(1))
        .map(|_| char::from(LOBBY_ID_ALPHABET[rng.random_range(0..LOBBY_ID_ALPHABET.len())]))
        .collect()
}

fn display_name(raw: &str, seat: Seat) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("Player {}", seat.ordinal())
    } else {
        name.to_string()
    }
}
