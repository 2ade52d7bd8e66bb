//! Scripted opponent difficulty configuration.

use serde::{Deserialize, Serialize};

/// Preset difficulty tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Scripted opponent tuning parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpponentConfig {
    /// Probability a flipped card is retained in memory.
    /// This is what bounds the opponent's effective skill.
    pub memory_rate: f64,

    /// Base delay in milliseconds before acting.
    /// Actual delays jitter between 0.5x and 1.0x of this value.
    pub thinking_time_ms: u64,

    /// Probability of deliberately ignoring known information.
    pub mistake_rate: f64,
}

impl OpponentConfig {
    /// Parameters for a preset difficulty tier.
    #[must_use]
    pub const fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                memory_rate: 0.3,
                thinking_time_ms: 2000,
                mistake_rate: 0.3,
            },
            Difficulty::Medium => Self {
                memory_rate: 0.6,
                thinking_time_ms: 1000,
                mistake_rate: 0.15,
            },
            Difficulty::Hard => Self {
                memory_rate: 0.9,
                thinking_time_ms: 500,
                mistake_rate: 0.05,
            },
        }
    }

    /// Create a new config with custom memory rate.
    #[must_use]
    pub fn with_memory_rate(mut self, rate: f64) -> Self {
        self.memory_rate = rate;
        self
    }

    /// Create a new config with custom thinking time.
    #[must_use]
    pub fn with_thinking_time_ms(mut self, ms: u64) -> Self {
        self.thinking_time_ms = ms;
        self
    }

    /// Create a new config with custom mistake rate.
    #[must_use]
    pub fn with_mistake_rate(mut self, rate: f64) -> Self {
        self.mistake_rate = rate;
        self
    }

    /// A config that always remembers and never errs, for tests that
    /// need fully deterministic opponent choices.
    #[must_use]
    pub fn perfect() -> Self {
        Self::for_difficulty(Difficulty::Hard)
            .with_memory_rate(1.0)
            .with_mistake_rate(0.0)
    }
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Medium)
    }
}
