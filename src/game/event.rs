//! Semantic events the driver emits for the UI and audio shells.
//!
//! Events describe what just happened, not how to render it: the UI
//! shell maps them to animations, the audio shell to effects, and the
//! core never depends on either consuming them.

use serde::{Deserialize, Serialize};

use crate::core::{PairId, Party, Symbol, Winner};

/// One observable game happening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum GameEvent {
    /// A card turned face up.
    CardFlipped { index: usize, symbol: Symbol, by: Party },

    /// The flipped pair matched and was resolved by `by`.
    MatchFound { pair: PairId, cards: [usize; 2], by: Party },

    /// The flipped pair did not match; resolved locally by `by`.
    Mismatch { cards: [usize; 2], by: Party },

    /// The remote party resolved a mismatch; flip these back.
    FlipBack { cards: [usize; 2] },

    /// The turn passed to `turn`.
    TurnChanged { turn: Party },

    /// One second elapsed on the active clock. `seconds` is time
    /// remaining for timed games, time elapsed for solo.
    TimerTick { seconds: u32 },

    /// The clock is running low.
    TimerWarning { seconds: u32 },

    /// A fresh board is live.
    GameStarted,

    /// The board is cleared or the clock ran out. `winner` is `None`
    /// for solo games.
    GameOver { winner: Option<Winner> },

    /// A guest claimed the second seat.
    OpponentJoined,

    /// The guest gave up its seat.
    OpponentLeft,

    /// The session document disappeared while we were in it.
    SessionClosed,

    /// The remote party asked for a rematch.
    RematchRequested { by: Party },

    /// Both parties agreed to return to the waiting room.
    ReturnedToLobby,
}
