//! Timers as explicit, cancellable state.
//!
//! Two pieces: a [`Scheduler`] of deadline-addressed tasks driven by
//! the embedder's monotonic clock, and [`Countdown`] second-counters
//! for the per-turn and whole-game disciplines. Neither spawns threads
//! or sleeps; cancellation is synchronous, so no stale callback can
//! fire against a torn-down session.

pub mod countdown;
pub mod scheduler;

pub use countdown::{Countdown, Tick};
pub use scheduler::{Scheduler, TaskId};
