//! Game driver configuration.

use serde::{Deserialize, Serialize};

use crate::core::BoardSize;

/// Who sits in the second seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// A remote peer playing over the shared document.
    Remote,
    /// The scripted opponent.
    Scripted,
    /// Nobody: solo play against a count-up clock.
    None,
}

/// Which clock discipline a timed game runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerDiscipline {
    /// 30-second budget per turn, reset on every turn change or match.
    /// Expiry is handled only by the active party.
    PerTurn,
    /// One countdown for the whole game, owned and synced by the host.
    /// Reaching zero ends the game at the current score.
    WholeGame,
}

/// Driver tuning parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Board side length for generated decks.
    pub board_size: BoardSize,

    /// Clock discipline for timed (remote) games. Scripted games always
    /// run per-turn; solo games are untimed.
    pub timer: TimerDiscipline,

    /// Pause between the second flip and match evaluation. Exists for
    /// perceptibility, not correctness.
    pub reveal_delay_ms: u64,

    /// Per-turn budget in seconds.
    pub turn_budget_secs: u32,

    /// Whole-game budget in seconds.
    pub game_budget_secs: u32,

    /// Remaining seconds at or below which ticks carry a warning.
    pub warn_below_secs: u32,

    /// Seed for deck shuffles and opponent rolls. Same seed, same game.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: BoardSize::Four,
            timer: TimerDiscipline::PerTurn,
            reveal_delay_ms: 800,
            turn_budget_secs: 30,
            game_budget_secs: 600,
            warn_below_secs: 5,
            seed: 42,
        }
    }
}

impl GameConfig {
    /// Create a new config with custom board size.
    #[must_use]
    pub fn with_board_size(mut self, size: BoardSize) -> Self {
        self.board_size = size;
        self
    }

    /// Create a new config with custom timer discipline.
    #[must_use]
    pub fn with_timer(mut self, timer: TimerDiscipline) -> Self {
        self.timer = timer;
        self
    }

    /// Create a new config with custom reveal delay.
    #[must_use]
    pub fn with_reveal_delay_ms(mut self, ms: u64) -> Self {
        self.reveal_delay_ms = ms;
        self
    }

    /// Create a new config with custom per-turn budget.
    #[must_use]
    pub fn with_turn_budget_secs(mut self, secs: u32) -> Self {
        self.turn_budget_secs = secs;
        self
    }

    /// Create a new config with custom whole-game budget.
    #[must_use]
    pub fn with_game_budget_secs(mut self, secs: u32) -> Self {
        self.game_budget_secs = secs;
        self
    }

    /// Create a new config with custom seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
