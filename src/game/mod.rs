//! The turn/match state machine and its surfaces.
//!
//! One driver covers all three ways to fill the second seat: a remote
//! peer over the shared document, the scripted opponent, or nobody.
//! The driver consumes UI intents and clock time, emits semantic
//! events, and re-derives a view model after every change.

pub mod config;
pub mod driver;
pub mod event;
pub mod reconcile;
pub mod view;

pub use config::{GameConfig, OpponentKind, TimerDiscipline};
pub use driver::GameDriver;
pub use event::GameEvent;
pub use reconcile::{diff_snapshots, SnapshotDiff};
pub use view::GameView;
