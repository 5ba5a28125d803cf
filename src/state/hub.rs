//! Connection hub.
//!
//! Binds real-time connections to (lobby, player) pairs, routes their inbound
//! frames to the [`SessionCoordinator`], and applies departure rules when a
//! player's last connection goes away.
//!
//! Locks are never nested: the registry and the hub's routing index are each
//! taken on their own, and a lobby is removed from the registry only after its
//! own lock has been released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::broadcast::{fan_out, send_to, EventKind};
use super::connection::{outbound_channel, Connection, ConnectionId, Outbound};
use super::lobby::{Lobby, LobbyError, LobbyManager};
use super::player::{PlayerId, Seat};
use super::protocol::{ClientMessage, Notification};
use super::session::{Departure, GuessOutcome, SessionCoordinator, SubmitOutcome};
use super::snapshot::{LobbySnapshot, PlayerRole};

/// Where a connection belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    lobby_id: String,
    player_id: PlayerId,
}

/// What a dispatched message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Applied,
    /// Accepted but nothing to do
    Ignored,
    /// The sender asked for the current state
    Snapshot(LobbySnapshot),
}

/// Routes connections and their messages to lobbies.
#[derive(Debug)]
pub struct Hub {
    lobbies: Arc<LobbyManager>,
    coordinator: SessionCoordinator,
    index: Mutex<HashMap<ConnectionId, Route>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new(lobbies: Arc<LobbyManager>) -> Self {
        let coordinator = SessionCoordinator::new(lobbies.config().clone());
        Self {
            lobbies,
            coordinator,
            index: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn lobbies(&self) -> &Arc<LobbyManager> {
        &self.lobbies
    }

    /// A fresh outbound channel sized from config.
    pub fn channel(&self) -> (Outbound, mpsc::Receiver<Arc<String>>) {
        outbound_channel(self.coordinator.config().outbound_buffer)
    }

    /// Bind a new connection for `player_id` in `lobby_id`.
    pub fn attach(
        &self,
        lobby_id: &str,
        player_id: PlayerId,
        outbound: Outbound,
    ) -> Result<ConnectionId, LobbyError> {
        let conn_id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let seat = self.with_lobby(lobby_id, |lobby| {
            let seat = lobby.require_seat(player_id)?;
            lobby
                .connections_mut()
                .insert(Connection::new(conn_id, player_id, outbound));
            Ok(seat)
        })?;

        self.index.lock().insert(
            conn_id,
            Route {
                lobby_id: lobby_id.to_string(),
                player_id,
            },
        );

        info!(lobby_id, %conn_id, %seat, "connection attached");
        Ok(conn_id)
    }

    /// Unbind a connection. If it was its player's last one, the player has
    /// left the lobby.
    pub fn detach(&self, conn_id: ConnectionId) {
        let Some(route) = self.index.lock().remove(&conn_id) else {
            return;
        };
        let Ok(shared) = self.lobbies.get(&route.lobby_id) else {
            return;
        };

        let (departure, abandoned) = {
            let mut lobby = shared.lock();
            if lobby.is_closed() {
                return;
            }
            lobby.connections_mut().remove(conn_id);

            let departure = match lobby.seat_of(route.player_id) {
                Some(seat) if lobby.connections().count_for(route.player_id) == 0 => {
                    Some(self.coordinator.depart(&mut lobby, seat))
                }
                _ => None,
            };

            // Nobody is watching any more
            let abandoned = lobby.connections().is_empty() && !lobby.is_closed();
            if abandoned {
                lobby.close();
            }
            (departure, abandoned)
        };

        info!(lobby_id = %route.lobby_id, %conn_id, "connection detached");
        self.settle(&route.lobby_id, departure, abandoned);
    }

    /// Seat `name` as the guest of `lobby_id`, announcing it to the lobby.
    pub fn join(&self, lobby_id: &str, name: &str) -> Result<PlayerId, LobbyError> {
        self.with_lobby(lobby_id, |lobby| self.coordinator.join(lobby, name))
            .map(|(_, player_id)| player_id)
    }

    /// `player_id` leaves `lobby_id` on purpose.
    pub fn leave(&self, lobby_id: &str, player_id: PlayerId) -> Result<(), LobbyError> {
        let departure = self.with_lobby(lobby_id, |lobby| {
            let seat = lobby.require_seat(player_id)?;
            Ok(self.coordinator.depart(lobby, seat))
        })?;
        self.settle(lobby_id, Some(departure), false);
        Ok(())
    }

    /// Registry and index bookkeeping after a departure. Runs with no lobby
    /// lock held.
    fn settle(&self, lobby_id: &str, departure: Option<Departure>, abandoned: bool) {
        let closed = matches!(departure, Some(Departure::LobbyClosed { .. }));
        if let Some(departure) = departure {
            let mut index = self.index.lock();
            for id in departure.dropped() {
                index.remove(id);
            }
        }
        if closed || abandoned {
            self.lobbies.delete(lobby_id);
        }
    }

    /// Apply one client message on behalf of `player_id`.
    pub fn dispatch(
        &self,
        lobby_id: &str,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> Result<Dispatched, LobbyError> {
        self.with_lobby(lobby_id, |lobby| match message {
            ClientMessage::Guess(letter) => {
                self.coordinator.guess(lobby, player_id, &letter)?;
                Ok(Dispatched::Applied)
            }
            ClientMessage::SubmitWord(word) => {
                self.coordinator.submit_word(lobby, player_id, &word)?;
                Ok(Dispatched::Applied)
            }
            ClientMessage::Restart => {
                self.coordinator.restart(lobby, player_id)?;
                Ok(Dispatched::Applied)
            }
            ClientMessage::Sync => {
                lobby.require_seat(player_id)?;
                Ok(Dispatched::Snapshot(LobbySnapshot::capture(lobby)))
            }
            ClientMessage::Update | ClientMessage::Instruction => Ok(Dispatched::Ignored),
            ClientMessage::Unknown(kind) => {
                debug!(lobby_id, kind = %kind, "ignoring unknown message type");
                Ok(Dispatched::Ignored)
            }
        })
    }

    /// Handle one inbound text frame from `conn_id`. Errors are logged and
    /// dropped; the connection stays open.
    pub fn handle_frame(&self, conn_id: ConnectionId, text: &str) {
        let Some(route) = self.index.lock().get(&conn_id).cloned() else {
            debug!(%conn_id, "frame from unknown connection");
            return;
        };

        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(lobby_id = %route.lobby_id, %conn_id, error = %e, "rejected frame");
                return;
            }
        };

        let result = match message {
            ClientMessage::Sync => self.resync(&route, conn_id),
            message => self
                .dispatch(&route.lobby_id, route.player_id, message)
                .map(|_| ()),
        };
        if let Err(e) = result {
            warn!(lobby_id = %route.lobby_id, %conn_id, error = %e, "rejected message");
        }
    }

    /// Send `conn_id` a snapshot. Capture and delivery share one lobby lock.
    fn resync(&self, route: &Route, conn_id: ConnectionId) -> Result<(), LobbyError> {
        self.with_lobby(&route.lobby_id, |lobby| {
            lobby.require_seat(route.player_id)?;
            let snapshot = LobbySnapshot::capture(lobby);
            if !send_to(lobby, conn_id, &Notification::Snapshot(snapshot.to_json())) {
                debug!(lobby_id = %lobby.id, %conn_id, "snapshot not delivered");
            }
            Ok(())
        })
    }

    /// Drive one connection until its inbound side closes.
    ///
    /// The transport pumps socket text frames into `inbound` and drains the
    /// receiver paired with `outbound` into the socket.
    pub async fn serve(
        &self,
        lobby_id: &str,
        player_id: PlayerId,
        outbound: Outbound,
        mut inbound: mpsc::Receiver<String>,
    ) -> Result<(), LobbyError> {
        let conn_id = self.attach(lobby_id, player_id, outbound)?;

        while let Some(frame) = inbound.recv().await {
            if !self.is_attached(conn_id) {
                break;
            }
            self.handle_frame(conn_id, &frame);
        }

        self.detach(conn_id);
        Ok(())
    }

    pub fn is_attached(&self, conn_id: ConnectionId) -> bool {
        self.index.lock().contains_key(&conn_id)
    }

    pub fn connection_count(&self) -> usize {
        self.index.lock().len()
    }

    pub fn submit_word(
        &self,
        lobby_id: &str,
        player_id: PlayerId,
        word: &str,
    ) -> Result<SubmitOutcome, LobbyError> {
        self.with_lobby(lobby_id, |lobby| {
            self.coordinator.submit_word(lobby, player_id, word)
        })
    }

    pub fn guess(
        &self,
        lobby_id: &str,
        player_id: PlayerId,
        letter: &str,
    ) -> Result<GuessOutcome, LobbyError> {
        self.with_lobby(lobby_id, |lobby| {
            self.coordinator.guess(lobby, player_id, letter)
        })
    }

    pub fn restart(&self, lobby_id: &str, player_id: PlayerId) -> Result<Seat, LobbyError> {
        self.with_lobby(lobby_id, |lobby| self.coordinator.restart(lobby, player_id))
    }

    pub fn snapshot(&self, lobby_id: &str) -> Result<LobbySnapshot, LobbyError> {
        self.with_lobby(lobby_id, |lobby| Ok(LobbySnapshot::capture(lobby)))
    }

    pub fn role(&self, lobby_id: &str, player_id: PlayerId) -> Result<PlayerRole, LobbyError> {
        self.with_lobby(lobby_id, |lobby| PlayerRole::of(lobby, player_id))
    }

    /// Close every lobby, telling every connection. Returns how many lobbies
    /// were closed.
    pub fn shutdown(&self) -> usize {
        let lobbies = self.lobbies.drain();
        for shared in &lobbies {
            let mut lobby = shared.lock();
            fan_out(&mut lobby, EventKind::CloseAll);
            lobby.close();
        }
        self.index.lock().clear();

        info!(lobbies = lobbies.len(), "hub shut down");
        lobbies.len()
    }

    /// Run `f` under the lock of an open lobby.
    fn with_lobby<T>(
        &self,
        lobby_id: &str,
        f: impl FnOnce(&mut Lobby) -> Result<T, LobbyError>,
    ) -> Result<T, LobbyError> {
        let shared = self.lobbies.get(lobby_id)?;
        let mut lobby = shared.lock();
        if lobby.is_closed() {
            return Err(LobbyError::NotFound(lobby_id.to_string()));
        }
        f(&mut lobby)
    }
}
