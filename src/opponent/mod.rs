//! Scripted opponent for single-player mode.
//!
//! Substitutes for the second party by producing the same moves a
//! remote player would: observe flips, remember some of them, and pick
//! cards with a skill bounded by the difficulty profile.

pub mod config;
pub mod memory;
pub mod scripted;

pub use config::{Difficulty, OpponentConfig};
pub use memory::OpponentMemory;
pub use scripted::ScriptedOpponent;
