//! Session coordinator.
//!
//! Turns player actions into lobby mutations and decides the resulting state
//! transitions. Every function here runs with the lobby lock held by the
//! caller, mutates, broadcasts through [`fan_out`], and finally calls
//! [`SessionCoordinator::advance`], the single place where readiness and
//! end-of-round are checked.

use tracing::{debug, info, warn};

use crate::config::GameConfig;

use super::broadcast::{fan_out, EventKind};
use super::connection::ConnectionId;
use super::game::{parse_letter, GameStatus, WordGame};
use super::lobby::{Lobby, LobbyError};
use super::lobby_state::{LobbyEvent, LobbyState};
use super::player::{PlayerId, Seat};

/// Result of a word submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub seat: Seat,
    /// This submission started the round
    pub started: bool,
}

/// Result of a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessOutcome {
    pub seat: Seat,
    pub letter: char,
    /// The letter revealed something
    pub progressed: bool,
    /// Status of the guesser's round after the guess
    pub status: GameStatus,
    /// Lobby state once every transition has run
    pub lobby_state: LobbyState,
}

/// What a departure did to the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// Host left; the lobby is closed and must be removed from the registry
    LobbyClosed { dropped: Vec<ConnectionId> },
    /// Guest left; their seat is free again
    SeatVacated { dropped: Vec<ConnectionId> },
}

impl Departure {
    pub fn dropped(&self) -> &[ConnectionId] {
        match self {
            Self::LobbyClosed { dropped } | Self::SeatVacated { dropped } => dropped,
        }
    }
}

/// Applies player actions to a locked lobby.
#[derive(Debug, Clone, Default)]
pub struct SessionCoordinator {
    config: GameConfig,
}

impl SessionCoordinator {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seat `name` in the free seat and tell everyone already attached.
    pub fn join(&self, lobby: &mut Lobby, name: &str) -> Result<(Seat, PlayerId), LobbyError> {
        let (seat, player_id) = lobby.join(name)?;
        fan_out(lobby, EventKind::Join(seat));
        info!(lobby_id = %lobby.id, player = %player_id, %seat, "player joined lobby");
        Ok((seat, player_id))
    }

    /// `player_id` chooses the word their opponent will guess.
    pub fn submit_word(
        &self,
        lobby: &mut Lobby,
        player_id: PlayerId,
        word: &str,
    ) -> Result<SubmitOutcome, LobbyError> {
        let seat = lobby.require_seat(player_id)?;
        if !lobby.state().accepts_words() {
            return Err(LobbyError::GameInProgress);
        }

        let game = WordGame::from_config(word, &self.config)?;
        lobby.engines_mut().install_authored(seat, game);
        if let Some(player) = lobby.player_mut(seat) {
            player.ready = true;
        }
        debug!(lobby_id = %lobby.id, %seat, "word submitted");
        fan_out(lobby, EventKind::Submit(seat));

        let before = lobby.state();
        self.advance(lobby);
        let started = before != LobbyState::Playing && lobby.state() == LobbyState::Playing;

        Ok(SubmitOutcome { seat, started })
    }

    /// `player_id` guesses a letter of their opponent's word.
    pub fn guess(
        &self,
        lobby: &mut Lobby,
        player_id: PlayerId,
        input: &str,
    ) -> Result<GuessOutcome, LobbyError> {
        let seat = lobby.require_seat(player_id)?;
        if !lobby.state().accepts_guesses() {
            return Err(LobbyError::NotStarted);
        }

        let letter = parse_letter(input)?;
        let round = lobby
            .engines_mut()
            .guessed_by_mut(seat)
            .ok_or(LobbyError::NotStarted)?;
        let progressed = round.guess(letter)?;
        let finished = round.is_finished();
        let status = round.status();

        if finished {
            let kind = match status {
                GameStatus::Won => EventKind::Win(seat),
                _ => EventKind::Lost(seat),
            };
            fan_out(lobby, kind);
        }
        fan_out(lobby, EventKind::Update);

        self.advance(lobby);

        Ok(GuessOutcome {
            seat,
            letter,
            progressed,
            status,
            lobby_state: lobby.state(),
        })
    }

    /// `player_id` asks for a rematch.
    ///
    /// Everyone is told who asked, and the lobby falls back to `Waiting`.
    /// Rounds are left alone; they are only cleared when a round ends.
    pub fn restart(&self, lobby: &mut Lobby, player_id: PlayerId) -> Result<Seat, LobbyError> {
        let seat = lobby.require_seat(player_id)?;
        if let Some(player) = lobby.player_mut(seat) {
            player.wants_restart = true;
        }

        fan_out(lobby, EventKind::Restart(seat));
        if lobby.state() != LobbyState::Waiting {
            step(lobby, LobbyEvent::Restart);
        }

        info!(lobby_id = %lobby.id, %seat, "restart requested");
        Ok(seat)
    }

    /// The player in `seat` has left.
    ///
    /// The host leaving closes the lobby for everyone. The guest leaving
    /// frees their seat, tells the host, and sends the lobby back to waiting
    /// for a new opponent.
    pub fn depart(&self, lobby: &mut Lobby, seat: Seat) -> Departure {
        if seat.is_host() {
            fan_out(lobby, EventKind::CloseAll);
            let dropped = lobby.close();
            info!(lobby_id = %lobby.id, "host left, lobby closed");
            return Departure::LobbyClosed { dropped };
        }

        fan_out(lobby, EventKind::PeerLeft { departed: seat });
        let dropped = match lobby.player(seat).map(|p| p.id) {
            Some(player_id) => lobby.connections_mut().remove_player(player_id),
            None => Vec::new(),
        };
        lobby.remove_player(seat);
        lobby.reset_round();
        step(lobby, LobbyEvent::PlayerLeft);

        info!(lobby_id = %lobby.id, %seat, "player left lobby");
        Departure::SeatVacated { dropped }
    }

    /// Run every transition the current lobby contents call for.
    ///
    /// * `Waiting` with both players ready becomes `Ready`, broadcasts the
    ///   opening `update` and `start_game`, then moves to `Playing`.
    /// * `Ready`/`Playing` with every live round finished becomes `Ended`,
    ///   broadcasts `end`, clears both rounds and readiness, and goes back to
    ///   `Waiting`.
    pub fn advance(&self, lobby: &mut Lobby) {
        if lobby.state() == LobbyState::Waiting && lobby.both_ready() {
            if lobby.transition(LobbyEvent::BothReady).is_ok() {
                for player in Seat::ALL {
                    if let Some(p) = lobby.player_mut(player) {
                        p.wants_restart = false;
                    }
                }
                fan_out(lobby, EventKind::Update);
                fan_out(lobby, EventKind::StartGame);
                step(lobby, LobbyEvent::Start);
                info!(lobby_id = %lobby.id, "round started");
            }
            return;
        }

        if lobby.state().accepts_guesses() && round_over(lobby) {
            if lobby.transition(LobbyEvent::RoundOver).is_ok() {
                fan_out(lobby, EventKind::End);
                lobby.reset_round();
                step(lobby, LobbyEvent::Reset);
                info!(lobby_id = %lobby.id, "round ended");
            }
        }
    }
}

/// Apply a transition that the current state always allows.
fn step(lobby: &mut Lobby, event: LobbyEvent) {
    if let Err(e) = lobby.transition(event) {
        warn!(lobby_id = %lobby.id, error = %e, "lobby transition refused");
    }
}

/// Whether every live round is over.
///
/// With two players both rounds must be terminal. A host sitting alone only
/// needs their own round to finish.
pub fn round_over(lobby: &Lobby) -> bool {
    let finished = |seat: Seat| {
        lobby
            .engines()
            .guessed_by(seat)
            .is_some_and(|g| g.status().is_terminal())
    };

    match (lobby.has_player(Seat::One), lobby.has_player(Seat::Two)) {
        (true, true) => finished(Seat::One) && finished(Seat::Two),
        (true, false) => finished(Seat::One),
        (false, true) => finished(Seat::Two),
        (false, false) => false,
    }
}
