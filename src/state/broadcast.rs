//! Fan-out of lobby events to attached connections.
//!
//! A broadcast is not one shared message. For every connection the payload is
//! derived from the same locked lobby by [`payload_for`], so player one and
//! player two each see their own progress first. Callers hold the lobby lock
//! for the whole fan-out.

use std::sync::Arc;

use tracing::{debug, warn};

use super::connection::ConnectionId;
use super::game::WordGame;
use super::lobby::Lobby;
use super::player::Seat;
use super::protocol::{CloseReason, Notification};

/// Lobby events that are broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Both rounds' progress, tailored per recipient
    Update,
    /// Round start, tailored per recipient
    StartGame,
    /// `seat` was just filled
    Join(Seat),
    /// `seat` submitted a word
    Submit(Seat),
    /// `seat` guessed their word
    Win(Seat),
    /// `seat` ran out of attempts
    Lost(Seat),
    /// `seat` asked for a rematch
    Restart(Seat),
    /// The lobby is being torn down
    CloseAll,
    /// `departed` left; only their opponent is told
    PeerLeft { departed: Seat },
    /// Every live round is over
    End,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::StartGame => "start_game",
            Self::Join(_) => "join",
            Self::Submit(_) => "submit",
            Self::Win(_) => "win",
            Self::Lost(_) => "lost",
            Self::Restart(_) => "restart",
            Self::CloseAll => "close_all",
            Self::PeerLeft { .. } => "close_one",
            Self::End => "end",
        }
    }
}

/// The notification `recipient` should get for `kind`, if any.
pub fn payload_for(lobby: &Lobby, recipient: Seat, kind: EventKind) -> Option<Notification> {
    let engines = lobby.engines();
    let own = engines.guessed_by(recipient);
    let theirs = engines.guessed_by(recipient.opponent());
    let revealed = |round: Option<&WordGame>| round.map(|g| g.revealed()).unwrap_or_default();

    match kind {
        EventKind::Update => Some(Notification::Update {
            revealed: revealed(own),
            attempts: own.map_or(lobby.max_attempts(), |g| g.attempts_remaining()),
            opponent_revealed: revealed(theirs),
            opponent_attempts: theirs.map_or(lobby.max_attempts(), |g| g.attempts_remaining()),
        }),
        EventKind::StartGame => Some(Notification::StartGame {
            revealed: revealed(own),
            opponent_revealed: revealed(theirs),
        }),
        EventKind::Join(seat) => lobby.player(seat).map(|p| Notification::Join {
            name: p.name.clone(),
        }),
        EventKind::Submit(seat) => Some(Notification::Submit { player: seat }),
        EventKind::Win(seat) => engines.guessed_by(seat).map(|g| Notification::Win {
            player: seat,
            word: g.word().to_string(),
        }),
        EventKind::Lost(seat) => engines.guessed_by(seat).map(|g| Notification::Lost {
            player: seat,
            word: g.word().to_string(),
        }),
        EventKind::Restart(seat) => Some(Notification::Restart { player: seat }),
        EventKind::CloseAll => Some(Notification::Close {
            reason: CloseReason::LobbyClosed,
        }),
        EventKind::PeerLeft { departed } if recipient == departed.opponent() => {
            Some(Notification::Close {
                reason: CloseReason::PeerLeft,
            })
        }
        EventKind::PeerLeft { .. } => None,
        EventKind::End => Some(Notification::End),
    }
}

/// Send `kind` to every connection of the lobby.
///
/// Payloads are rendered at most once per seat. Connections that fail to
/// accept the frame are dropped from the lobby; the rest still get it.
/// Returns how many connections received the event.
pub fn fan_out(lobby: &mut Lobby, kind: EventKind) -> usize {
    let mut rendered: [Option<Option<Arc<String>>>; 2] = [None, None];
    let mut broken: Vec<ConnectionId> = Vec::new();
    let mut delivered = 0;

    for conn in lobby.connections().iter() {
        let Some(seat) = lobby.seat_of(conn.player_id) else {
            continue;
        };
        let frame = rendered[seat.index()]
            .get_or_insert_with(|| payload_for(lobby, seat, kind).map(|n| Arc::new(n.encode())))
            .clone();
        let Some(frame) = frame else {
            continue;
        };

        match conn.send(frame) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(lobby_id = %lobby.id, conn_id = %conn.id, kind = kind.as_str(), error = %e, "dropping broken connection");
                broken.push(conn.id);
            }
        }
    }

    for id in &broken {
        lobby.connections_mut().remove(*id);
    }

    debug!(lobby_id = %lobby.id, kind = kind.as_str(), recipients = delivered, dropped = broken.len(), "broadcast event");
    delivered
}

/// Send a single notification to one connection.
pub fn send_to(lobby: &mut Lobby, conn_id: ConnectionId, notification: &Notification) -> bool {
    let Some(conn) = lobby.connections().get(conn_id) else {
        return false;
    };
    match conn.send(Arc::new(notification.encode())) {
        Ok(()) => true,
        Err(e) => {
            warn!(lobby_id = %lobby.id, %conn_id, kind = notification.kind(), error = %e, "dropping broken connection");
            lobby.connections_mut().remove(conn_id);
            false
        }
    }
}
