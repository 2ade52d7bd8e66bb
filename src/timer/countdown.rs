//! Second-resolution countdown state.
//!
//! One `Countdown` backs either discipline: the 30-second per-turn
//! budget that resets on every turn change or match, and the host-owned
//! whole-game budget that is mirrored to the guest through the session
//! document.

/// What a single one-second tick produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Still counting down.
    Running { remaining: u32, warning: bool },
    /// This tick reached zero.
    Expired,
}

/// A countdown from a fixed budget of seconds.
#[derive(Clone, Debug)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    warn_below: u32,
}

impl Countdown {
    /// Create a countdown with `budget` seconds, warning once the
    /// remainder drops to `warn_below` or less.
    #[must_use]
    pub fn new(budget: u32, warn_below: u32) -> Self {
        Self { budget, remaining: budget, warn_below }
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Restore the full budget.
    pub fn reset(&mut self) {
        self.remaining = self.budget;
    }

    /// Consume one second.
    ///
    /// Once expired, further ticks keep reporting `Expired` without
    /// underflowing; callers stop or reset the clock on expiry.
    pub fn tick(&mut self) -> Tick {
        if self.remaining == 0 {
            return Tick::Expired;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Running {
                remaining: self.remaining,
                warning: self.remaining <= self.warn_below,
            }
        }
    }
}
