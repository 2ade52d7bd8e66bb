//! # pair-duel
//!
//! The synchronization core of a turn-based matching-pairs card game:
//! solo against the clock, single-player against a scripted opponent,
//! or head-to-head over a shared replicated session document — with no
//! central authority arbitrating moves.
//!
//! ## Design
//!
//! - **One document, one owner per write**: both parties replicate the
//!   same session document; every field group has exactly one logical
//!   writer per transition (the acting party resolves the pair it
//!   initiated, the host starts games and ticks the whole-game clock),
//!   which is what keeps replicas consistent without locking.
//!
//! - **One state machine, three opponent kinds**: the same driver runs
//!   remote, scripted, and solo play; only the second seat's move
//!   source differs.
//!
//! - **No hidden concurrency**: the embedder owns the clock. Delays
//!   and countdowns are explicit cancellable tasks in a scheduler the
//!   embedder drives with monotonic time; nothing blocks, sleeps, or
//!   spawns threads.
//!
//! - **Deterministic randomness**: deck shuffles, room codes, and
//!   every opponent roll come from one seeded, forkable RNG, so whole
//!   games replay identically in tests.
//!
//! ## Modules
//!
//! - `core`: cards, deck generation, party roles, RNG
//! - `store`: session document schema, patches, the store trait, and
//!   an in-process reference store
//! - `session`: room codes, create/join/leave, presence, signals
//! - `game`: the turn/match state machine, events, and view model
//! - `opponent`: the scripted opponent and its difficulty profiles
//! - `timer`: cancellable scheduled tasks and countdowns

pub mod core;
pub mod game;
pub mod opponent;
pub mod session;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use crate::core::{
    generate_deck, BoardSize, Card, GameRng, PairId, Party, PerParty, Symbol, Winner,
};

pub use crate::store::{
    DisconnectAction, DocPatch, MemoryClient, MemoryStore, MismatchRecord, PartySeat,
    SessionDoc, SessionStatus, SessionStore, StoreError, Subscription,
};

pub use crate::session::{Session, SessionError, SessionSignal};

pub use crate::game::{
    GameConfig, GameDriver, GameEvent, GameView, OpponentKind, TimerDiscipline,
};

pub use crate::opponent::{Difficulty, OpponentConfig, OpponentMemory, ScriptedOpponent};

pub use crate::timer::{Countdown, Scheduler, TaskId, Tick};
