//! Word Duel State Library
//!
//! This crate provides lobby, session and real-time broadcast state for
//! two-player word-guessing duels.
//!
//! # Overview
//!
//! Two players share a lobby. Each submits a secret word, then each guesses
//! the word the *other* submitted, one letter at a time, with a limited
//! number of wrong guesses. Progress is pushed to every attached connection
//! as it happens, tailored to the player that connection belongs to.
//!
//! The state module provides:
//!
//! - **Word Engine** - One round: mask, attempts, guessed letters, win/loss.
//!
//! - **Lobby Management** - Two seats, cross-mapped rounds, a validated
//!   lifecycle state machine and a shared registry.
//!
//! - **Session Coordination** - Word submission, guesses, restarts and
//!   departures, with round start and end decided in one place.
//!
//! - **Real-time Fan-out** - Per-recipient payloads over bounded channels;
//!   broken connections are dropped without affecting the rest.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - Invalid lobby state changes are
//!    rejected with clear errors.
//!
//! 2. **One lock per lobby** - Every mutation and its broadcast happen under
//!    that lobby's lock; the registry lock is never held inside it.
//!
//! 3. **No networking** - This crate is pure state plus channels. HTTP,
//!    cookies and socket upgrades belong to the embedding server.
//!
//! 4. **Serialization-ready** - Notifications and snapshots render to JSON.
//!
//! # Example
//!
//! ```rust
//! use wordduel_state::{AppState, GameConfig, LobbyState};
//!
//! let app = AppState::new(GameConfig::default());
//! let (lobby_id, host) = app.create_lobby("Ada");
//! let guest = app.join_lobby(&lobby_id, "Brian").unwrap();
//!
//! // Attach a connection for the host
//! let (outbound, mut frames) = app.hub.channel();
//! app.hub.attach(&lobby_id, host, outbound).unwrap();
//!
//! app.hub.submit_word(&lobby_id, host, "apple").unwrap();
//! app.hub.submit_word(&lobby_id, guest, "plum").unwrap();
//! assert_eq!(app.hub.snapshot(&lobby_id).unwrap().state, LobbyState::Playing);
//!
//! // The host heard both submissions, then the start
//! let first = frames.try_recv().unwrap();
//! assert!(first.contains("\"submit\""));
//! ```

pub mod config;
pub mod state;

// Re-export everything from state module at crate root
pub use config::*;
pub use state::*;
