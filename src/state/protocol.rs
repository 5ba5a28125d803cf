//! Wire envelopes for the real-time channel.
//!
//! Every frame in either direction is a JSON object `{"type": ..., "payload": ...}`.
//! Outbound payloads are flat objects of string values; the field names are
//! the contract with the browser client and must not change.

use serde::Deserialize;
use serde_json::{json, Value};

use super::player::Seat;

/// Why a `close` notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The lobby is gone
    LobbyClosed,
    /// The other player left; the lobby stays open
    PeerLeft,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LobbyClosed => "close",
            Self::PeerLeft => "left",
        }
    }
}

/// Outbound notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Progress of both rounds, recipient's own first
    Update {
        revealed: String,
        attempts: u32,
        opponent_revealed: String,
        opponent_attempts: u32,
    },
    StartGame {
        revealed: String,
        opponent_revealed: String,
    },
    /// A guest took the free seat
    Join { name: String },
    /// `player` has chosen a word
    Submit { player: Seat },
    Win { player: Seat, word: String },
    Lost { player: Seat, word: String },
    Restart { player: Seat },
    Close { reason: CloseReason },
    End,
    /// Full lobby snapshot, sent on request
    Snapshot(Value),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::StartGame { .. } => "start_game",
            Self::Join { .. } => "join",
            Self::Submit { .. } => "submit",
            Self::Win { .. } => "win",
            Self::Lost { .. } => "lost",
            Self::Restart { .. } => "restart",
            Self::Close { .. } => "close",
            Self::End => "end",
            Self::Snapshot(_) => "snapshot",
        }
    }

    fn payload(&self) -> Value {
        match self {
            Self::Update {
                revealed,
                attempts,
                opponent_revealed,
                opponent_attempts,
            } => json!({
                "revealed": revealed,
                "attempts": attempts.to_string(),
                "opponent_revealed": opponent_revealed,
                "opponent_attempts": opponent_attempts.to_string()
            }),
            Self::StartGame {
                revealed,
                opponent_revealed,
            } => json!({
                "revealed": revealed,
                "opponent_revealed": opponent_revealed
            }),
            Self::Join { name } => json!({ "message": name }),
            Self::Submit { player } => json!({ "player": player.ordinal() }),
            Self::Win { player, word } | Self::Lost { player, word } => json!({
                "player": player.ordinal(),
                "word": word
            }),
            Self::Restart { player } => json!({ "player": player.ordinal() }),
            Self::Close { reason } => json!({ "message": reason.as_str() }),
            Self::End => json!({ "message": "end" }),
            Self::Snapshot(snapshot) => snapshot.clone(),
        }
    }

    /// Envelope as JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.kind(),
            "payload": self.payload()
        })
    }

    /// Envelope as a text frame.
    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }
}

/// Inbound message from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Guess(String),
    SubmitWord(String),
    Restart,
    /// Ask for a snapshot to resynchronize
    Sync,
    /// Legacy no-op kept by older clients
    Update,
    /// Client-side instruction echo; instructions are derived from lobby state
    Instruction,
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Errors decoding inbound frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("'{kind}' expects a string payload")]
    BadPayload { kind: String },
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let RawEnvelope { kind, payload } = serde_json::from_str(text)?;

        match kind.as_str() {
            "guess" => Ok(Self::Guess(text_payload(&kind, payload)?)),
            "submit" | "submitWord" | "submit_word" => {
                Ok(Self::SubmitWord(text_payload(&kind, payload)?))
            }
            "restart" => Ok(Self::Restart),
            "sync" | "state" => Ok(Self::Sync),
            "update" => Ok(Self::Update),
            "instruction" => Ok(Self::Instruction),
            _ => Ok(Self::Unknown(kind)),
        }
    }
}

fn text_payload(kind: &str, payload: Value) -> Result<String, ProtocolError> {
    match payload {
        Value::String(s) => Ok(s),
        _ => Err(ProtocolError::BadPayload {
            kind: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_envelope() {
        let n = Notification::Update {
            revealed: "a__le".into(),
            attempts: 5,
            opponent_revealed: "____".into(),
            opponent_attempts: 6,
        };
        assert_eq!(
            n.to_json(),
            json!({
                "type": "update",
                "payload": {
                    "revealed": "a__le",
                    "attempts": "5",
                    "opponent_revealed": "____",
                    "opponent_attempts": "6"
                }
            })
        );
    }

    #[test]
    fn test_uniform_envelopes() {
        assert_eq!(
            Notification::Lost {
                player: Seat::Two,
                word: "plum".into()
            }
            .to_json(),
            json!({"type": "lost", "payload": {"player": "2", "word": "plum"}})
        );
        assert_eq!(
            Notification::Restart { player: Seat::One }.to_json(),
            json!({"type": "restart", "payload": {"player": "1"}})
        );
        assert_eq!(
            Notification::Close {
                reason: CloseReason::LobbyClosed
            }
            .to_json(),
            json!({"type": "close", "payload": {"message": "close"}})
        );
        assert_eq!(
            Notification::End.to_json(),
            json!({"type": "end", "payload": {"message": "end"}})
        );
    }

    #[test]
    fn test_join_and_submit_envelopes() {
        assert_eq!(
            Notification::Join {
                name: "Brian".into()
            }
            .to_json(),
            json!({"type": "join", "payload": {"message": "Brian"}})
        );
        assert_eq!(
            Notification::Submit { player: Seat::Two }.to_json(),
            json!({"type": "submit", "payload": {"player": "2"}})
        );
    }

    #[test]
    fn test_encode_is_valid_json() {
        let text = Notification::StartGame {
            revealed: "___".into(),
            opponent_revealed: "____".into(),
        }
        .encode();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["type"], "start_game");
        assert_eq!(back["payload"]["opponent_revealed"], "____");
    }

    #[test]
    fn test_parse_client_messages() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"guess","payload":"e"}"#).unwrap(),
            ClientMessage::Guess("e".into())
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"submit","payload":"apple"}"#).unwrap(),
            ClientMessage::SubmitWord("apple".into())
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"submitWord","payload":"apple"}"#).unwrap(),
            ClientMessage::SubmitWord("apple".into())
        );
        // Restart payload is ignored; identity comes from the connection
        assert_eq!(
            ClientMessage::parse(r#"{"type":"restart","payload":"whatever"}"#).unwrap(),
            ClientMessage::Restart
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"sync"}"#).unwrap(),
            ClientMessage::Sync
        );
        assert_eq!(
            ClientMessage::parse(
                r#"{"type":"instruction","payload":{"player":"OneOpp","instruction":""}}"#
            )
            .unwrap(),
            ClientMessage::Instruction
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"dance","payload":1}"#).unwrap(),
            ClientMessage::Unknown("dance".into())
        );
    }

    #[test]
    fn test_parse_rejects_bad_frames() {
        assert!(matches!(
            ClientMessage::parse("{not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"payload":"e"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"guess","payload":5}"#),
            Err(ProtocolError::BadPayload { .. })
        ));
    }
}
