//! The scripted opponent: difficulty-tuned stand-in for a second party.
//!
//! The opponent watches every flip on the board (its own and the human
//! player's), retains what it saw with probability `memory_rate`, and
//! when asked to move prefers fully known pairs unless a mistake roll
//! suppresses the knowledge. Choice falls back to a uniformly random
//! available card, so even a perfect memory never stalls.
//!
//! Timing lives with the caller: [`think_delay_ms`] yields a jittered
//! delay to schedule before each pick, and the caller re-checks whose
//! turn it is when the delay fires.
//!
//! [`think_delay_ms`]: ScriptedOpponent::think_delay_ms

use crate::core::{GameRng, Symbol};

use super::config::OpponentConfig;
use super::memory::OpponentMemory;

/// A scripted opponent with simulated memory.
#[derive(Clone, Debug)]
pub struct ScriptedOpponent {
    config: OpponentConfig,
    memory: OpponentMemory,
    rng: GameRng,
}

impl ScriptedOpponent {
    /// Create an opponent with the given tuning and RNG stream.
    #[must_use]
    pub fn new(config: OpponentConfig, rng: GameRng) -> Self {
        Self { config, memory: OpponentMemory::new(), rng }
    }

    /// The active tuning parameters.
    #[must_use]
    pub fn config(&self) -> &OpponentConfig {
        &self.config
    }

    /// Discard all observations, for a fresh game.
    pub fn reset(&mut self) {
        self.memory.clear();
    }

    /// Watch a card being flipped. Retention is probabilistic; call
    /// this for every flip by either side.
    pub fn observe(&mut self, index: usize, symbol: Symbol) {
        if self.rng.gen_fraction() < self.config.memory_rate {
            self.memory.remember(index, symbol);
        }
    }

    /// A pair at this index resolved; nothing there is worth knowing
    /// any more.
    pub fn forget(&mut self, index: usize) {
        self.memory.forget(index);
    }

    /// Jittered delay before the next pick, between 0.5x and 1.0x of
    /// the configured thinking time.
    pub fn think_delay_ms(&mut self) -> u64 {
        let base = self.config.thinking_time_ms as f64;
        (base * (0.5 + self.rng.gen_fraction() * 0.5)) as u64
    }

    /// Pick the first card of a move.
    ///
    /// A fully known available pair wins unless the mistake roll
    /// suppresses it; otherwise uniform random over `available`.
    /// Returns `None` only when `available` is empty.
    pub fn choose_first(&mut self, available: &[usize]) -> Option<usize> {
        if available.is_empty() {
            return None;
        }

        for (_, indices) in self.memory.known_pairs(available) {
            if self.rng.gen_fraction() > self.config.mistake_rate {
                return Some(indices[0]);
            }
        }

        self.rng.choose(available).copied()
    }

    /// Pick the second card of a move, given the first flip.
    ///
    /// A retained partner of `first_symbol` wins unless suppressed;
    /// otherwise uniform random over `available` excluding `first`.
    pub fn choose_second(
        &mut self,
        first: usize,
        first_symbol: Symbol,
        available: &[usize],
    ) -> Option<usize> {
        if let Some(partner) = self.memory.partner_of(first_symbol, first, available) {
            if self.rng.gen_fraction() > self.config.mistake_rate {
                return Some(partner);
            }
        }

        let choices: Vec<usize> = available.iter().copied().filter(|&i| i != first).collect();
        if choices.is_empty() {
            return available.first().copied();
        }
        self.rng.choose(&choices).copied()
    }

    /// Number of retained observations, for diagnostics.
    #[must_use]
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }
}
