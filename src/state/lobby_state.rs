//! Lobby state machine.
//!
//! Every lobby-level state change goes through [`LobbyState::apply`], so the
//! readiness and end-of-round checks live in one place.
//!
//! # State Diagram
//!
//! ```text
//!        create / restart / player left
//!                    │
//!                    ▼
//!             ┌─────────────┐  both_ready   ┌─────────────┐
//!   ┌────────▶│   Waiting   │──────────────▶│    Ready    │
//!   │         └─────────────┘               └──────┬──────┘
//!   │                ▲                             │ start (start_game sent)
//!   │                │ reset                       ▼
//!   │         ┌──────┴──────┐  round_over   ┌─────────────┐
//!   │         │    Ended    │◀──────────────│   Playing   │
//!   │         └─────────────┘               └─────────────┘
//!   │                                              │
//!   └──────────────────────────────────────────────┘
//!                 restart / player left
//! ```

use std::fmt;

/// Lobby-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LobbyState {
    /// Fewer than two players, or not both words submitted
    #[default]
    Waiting,

    /// Both players submitted a word
    Ready,

    /// `start_game` has been broadcast
    Playing,

    /// Every live round reached a terminal status
    Ended,
}

impl LobbyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }

    /// Guesses are only taken once both rounds exist.
    pub fn accepts_guesses(&self) -> bool {
        matches!(self, Self::Ready | Self::Playing)
    }

    /// Words may be (re)submitted until the round starts.
    pub fn accepts_words(&self) -> bool {
        matches!(self, Self::Waiting | Self::Ended)
    }

    /// Apply an event, returning the new state or an error.
    pub fn apply(&self, event: LobbyEvent) -> Result<Self, InvalidTransition> {
        use LobbyEvent::*;
        use LobbyState::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: *self,
            event,
            reason,
        };

        match (self, event) {
            // BothReady: Waiting -> Ready
            (Waiting, BothReady) => Ok(Ready),
            (_, BothReady) => Err(invalid("Round already under way")),

            // Start: Ready -> Playing
            (Ready, Start) => Ok(Playing),
            (Playing, Start) => Err(invalid("Already playing")),
            (_, Start) => Err(invalid("Both words must be submitted first")),

            // RoundOver: Ready/Playing -> Ended
            (Ready | Playing, RoundOver) => Ok(Ended),
            (_, RoundOver) => Err(invalid("No round in progress")),

            // Reset: Ended -> Waiting
            (Ended, Reset) => Ok(Waiting),
            (_, Reset) => Err(invalid("Round has not ended")),

            // Restart and departures always fall back to Waiting
            (_, Restart) | (_, PlayerLeft) => Ok(Waiting),
        }
    }

    /// Apply an event in place.
    pub fn apply_mut(&mut self, event: LobbyEvent) -> Result<(), InvalidTransition> {
        *self = self.apply(event)?;
        Ok(())
    }
}

impl fmt::Display for LobbyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyEvent {
    BothReady,
    Start,
    RoundOver,
    Reset,
    Restart,
    PlayerLeft,
}

/// Error when a state transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition from {from} via {event:?}: {reason}")]
pub struct InvalidTransition {
    pub from: LobbyState,
    pub event: LobbyEvent,
    pub reason: &'static str,
}
