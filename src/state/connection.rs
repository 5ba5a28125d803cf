//! Live connection tracking.
//!
//! A connection is one real-time channel to a browser tab. The transport
//! layer owns the socket; the core only holds the sending half of a bounded
//! channel that the transport drains into the socket. A player may have
//! several connections at once (duplicated tabs).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::player::PlayerId;

/// Sending half of a connection's outbound channel. Frames are encoded JSON.
pub type Outbound = mpsc::Sender<Arc<String>>;

/// Create an outbound channel with room for `buffer` frames.
pub fn outbound_channel(buffer: usize) -> (Outbound, mpsc::Receiver<Arc<String>>) {
    mpsc::channel(buffer.max(1))
}

/// Process-unique connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a frame could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    #[error("outbound buffer full")]
    Full,

    #[error("connection closed")]
    Closed,
}

/// One attached connection.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,

    /// Player that owns this connection
    pub player_id: PlayerId,

    outbound: Outbound,

    pub connected_at: Instant,
}

impl Connection {
    pub fn new(id: ConnectionId, player_id: PlayerId, outbound: Outbound) -> Self {
        Self {
            id,
            player_id,
            outbound,
            connected_at: Instant::now(),
        }
    }

    /// Queue a frame without waiting. A full buffer counts as a failure so a
    /// stalled client can never block the lobby.
    pub fn send(&self, frame: Arc<String>) -> Result<(), SendFailure> {
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendFailure::Full,
            mpsc::error::TrySendError::Closed(_) => SendFailure::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Connections attached to one lobby, keyed by handle.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, conn: Connection) {
        self.connections.insert(conn.id, conn);
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections owned by `player_id`.
    pub fn for_player(&self, player_id: PlayerId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.player_id == player_id)
    }

    pub fn count_for(&self, player_id: PlayerId) -> usize {
        self.for_player(player_id).count()
    }

    /// Remove every connection owned by `player_id`, returning their handles.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Vec<ConnectionId> {
        let ids: Vec<ConnectionId> = self.for_player(player_id).map(|c| c.id).collect();
        for id in &ids {
            self.connections.remove(id);
        }
        ids
    }

    /// Remove everything, returning the handles.
    pub fn drain(&mut self) -> Vec<ConnectionId> {
        self.connections.drain().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(id: u64, player_id: PlayerId) -> (Connection, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = outbound_channel(2);
        (Connection::new(ConnectionId(id), player_id, tx), rx)
    }

    #[test]
    fn test_send_and_receive() {
        let (conn, mut rx) = make_connection(1, PlayerId::new());
        conn.send(Arc::new("hello".to_string())).unwrap();
        assert_eq!(rx.try_recv().unwrap().as_str(), "hello");
    }

    #[test]
    fn test_send_full_buffer() {
        let (conn, _rx) = make_connection(1, PlayerId::new());
        conn.send(Arc::new("a".into())).unwrap();
        conn.send(Arc::new("b".into())).unwrap();
        assert_eq!(conn.send(Arc::new("c".into())), Err(SendFailure::Full));
    }

    #[test]
    fn test_send_closed() {
        let (conn, rx) = make_connection(1, PlayerId::new());
        drop(rx);
        assert!(conn.is_closed());
        assert_eq!(conn.send(Arc::new("a".into())), Err(SendFailure::Closed));
    }

    #[test]
    fn test_set_by_player() {
        let alice = PlayerId::new();
        let bob = PlayerId::new();
        let mut set = ConnectionSet::new();

        // Alice has two tabs
        set.insert(make_connection(1, alice).0);
        set.insert(make_connection(2, alice).0);
        set.insert(make_connection(3, bob).0);

        assert_eq!(set.len(), 3);
        assert_eq!(set.count_for(alice), 2);
        assert_eq!(set.count_for(bob), 1);

        let mut removed = set.remove_player(alice);
        removed.sort();
        assert_eq!(removed, vec![ConnectionId(1), ConnectionId(2)]);
        assert_eq!(set.len(), 1);
        assert!(set.get(ConnectionId(3)).is_some());

        set.remove(ConnectionId(3));
        assert!(set.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }
}
