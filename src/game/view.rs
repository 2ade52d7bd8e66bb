//! The derived view model handed to the rendering shell.
//!
//! One [`GameView`] is re-derived from the session state after every
//! change; the shell renders it without reaching into driver internals.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Card, PairId, Party, PerParty, Winner};
use crate::store::{SessionDoc, SessionStatus};

/// Everything the rendering shell needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    /// The full deck in board order.
    pub cards: Vec<Card>,
    /// Indices currently face up and unresolved.
    pub flipped: SmallVec<[usize; 2]>,
    /// Pairs resolved so far.
    pub matched_pair_ids: Vec<PairId>,
    /// Resolved-pair count per seat.
    pub scores: PerParty<u32>,
    /// Whose turn it is.
    pub current_turn: Party,
    /// Whether the local party may act.
    pub is_local_turn: bool,
    /// Seconds left on the active clock; `None` when untimed.
    pub seconds_remaining: Option<u32>,
    /// Seconds played so far; only set for solo games.
    pub seconds_elapsed: Option<u32>,
    /// Session lifecycle state.
    pub status: SessionStatus,
    /// Outcome once ended; `None` while playing and for solo games.
    pub winner: Option<Winner>,
    /// Completed two-flip attempts by either side.
    pub moves: u32,
    /// Whether the second seat is taken (waiting-room UI).
    pub opponent_seated: bool,
    /// Whether the guest flagged ready (gates the host's start).
    pub opponent_ready: bool,
}

impl GameView {
    /// Derive a view from the latest document state.
    #[must_use]
    pub fn derive(
        doc: &SessionDoc,
        local: Party,
        seconds_remaining: Option<u32>,
        seconds_elapsed: Option<u32>,
        moves: u32,
    ) -> Self {
        Self {
            cards: doc.cards.clone(),
            flipped: doc.flipped.clone(),
            matched_pair_ids: doc.matched_pair_ids(),
            scores: doc.scores,
            current_turn: doc.current_turn,
            is_local_turn: doc.current_turn == local,
            seconds_remaining,
            seconds_elapsed,
            status: doc.status,
            winner: doc.winner,
            moves,
            opponent_seated: doc.guest.is_some(),
            opponent_ready: doc.guest.as_ref().is_some_and(|g| g.ready),
        }
    }
}
