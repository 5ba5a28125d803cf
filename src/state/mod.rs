//! State management module for word duels.
//!
//! This module provides the core state types and managers:
//!
//! - `game` - Word-guess engine (one player's round)
//! - `player` - Player identity and seats
//! - `lobby_state` - Lobby lifecycle state machine
//! - `lobby` - Lobby aggregate and the lobby registry
//! - `session` - Applies player actions and round transitions
//! - `connection` - Live connection handles and outbound channels
//! - `protocol` - Wire envelopes
//! - `broadcast` - Per-recipient fan-out
//! - `hub` - Connection routing and departure handling
//! - `snapshot` - Point-in-time lobby views
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              AppState                                 │
//! │                                                                       │
//! │  ┌──────────────────┐        ┌────────────────────────────────────┐  │
//! │  │   LobbyManager   │◀───────│                Hub                 │  │
//! │  │                  │        │                                    │  │
//! │  │ lobby_id →       │        │ conn_id → (lobby_id, player_id)    │  │
//! │  │   Arc<Mutex<     │        │                                    │  │
//! │  │     Lobby>>      │        │ SessionCoordinator                 │  │
//! │  └──────────────────┘        │   submit_word / guess / restart    │  │
//! │                              │   depart / advance                 │  │
//! │                              └────────────────────────────────────┘  │
//! │                                                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐ │
//! │  │                       Lobby (per lobby lock)                     │ │
//! │  │                                                                  │ │
//! │  │  seats[2]   engines.by_guesser[2]   ConnectionSet   LobbyState   │ │
//! │  │                                                                  │ │
//! │  │  Waiting ──▶ Ready ──▶ Playing ──▶ Ended ──▶ Waiting             │ │
//! │  │     ▲                                           │                │ │
//! │  │     └──────────── Restart / PlayerLeft ─────────┘                │ │
//! │  └─────────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use wordduel_state::{state::AppState, GameConfig};
//!
//! let app = AppState::new(GameConfig::default());
//! let (lobby, host) = app.lobbies.create("Ada");
//! let lobby_id = lobby.lock().id.clone();
//!
//! // In the socket task
//! let (outbound, frames) = app.hub.channel();
//! app.hub.serve(&lobby_id, host, outbound, inbound).await?;
//! ```

pub mod broadcast;
pub mod connection;
pub mod game;
pub mod hub;
pub mod lobby;
pub mod lobby_state;
pub mod player;
pub mod protocol;
pub mod session;
pub mod snapshot;

use std::sync::Arc;

use tracing::info;

use crate::config::GameConfig;

// Re-export commonly used types
pub use broadcast::{fan_out, payload_for, EventKind};
pub use connection::{outbound_channel, Connection, ConnectionId, ConnectionSet, Outbound, SendFailure};
pub use game::{GameError, GameStatus, WordGame};
pub use hub::{Dispatched, Hub};
pub use lobby::{Engines, Lobby, LobbyError, LobbyManager, LobbySummary, SharedLobby};
pub use lobby_state::{InvalidTransition, LobbyEvent, LobbyState};
pub use player::{Player, PlayerId, Seat};
pub use protocol::{ClientMessage, CloseReason, Notification, ProtocolError};
pub use session::{Departure, GuessOutcome, SessionCoordinator, SubmitOutcome};
pub use snapshot::{LobbySnapshot, PlayerRole, SeatView};

/// Combined application state.
///
/// Built once at startup and handed to the request and socket layers.
#[derive(Debug)]
pub struct AppState {
    pub config: GameConfig,
    pub lobbies: Arc<LobbyManager>,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        let lobbies = Arc::new(LobbyManager::new(config.clone()));
        let hub = Arc::new(Hub::new(Arc::clone(&lobbies)));
        Self {
            config,
            lobbies,
            hub,
        }
    }

    /// Open a lobby; returns its id and the host's player id.
    pub fn create_lobby(&self, host_name: &str) -> (String, PlayerId) {
        let (lobby, host) = self.lobbies.create(host_name);
        let id = lobby.lock().id.clone();
        (id, host)
    }

    /// Join a lobby as the guest. Attached connections hear about it.
    pub fn join_lobby(&self, lobby_id: &str, name: &str) -> Result<PlayerId, LobbyError> {
        self.hub.join(lobby_id, name)
    }

    /// Close every lobby and drop every connection.
    pub fn shutdown(&self) -> usize {
        let closed = self.hub.shutdown();
        info!(closed, "state shut down");
        closed
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_state_basic() {
        let app = AppState::default();

        let (lobby_id, host) = app.create_lobby("Ada");
        assert_eq!(lobby_id.len(), 6);
        let guest = app.join_lobby(&lobby_id, "Brian").unwrap();
        assert_ne!(host, guest);

        assert_eq!(app.hub.role(&lobby_id, guest).unwrap().role, "guest");
        assert_eq!(app.join_lobby(&lobby_id, "Cleo"), Err(LobbyError::Full));

        assert_eq!(app.shutdown(), 1);
        assert!(matches!(
            app.join_lobby(&lobby_id, "Cleo"),
            Err(LobbyError::NotFound(_))
        ));
    }
}
