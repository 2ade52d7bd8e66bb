//! Core game types: cards, decks, party roles, RNG.
//!
//! These are the building blocks every other module shares. Nothing in
//! here knows about sessions or the document store.

pub mod card;
pub mod party;
pub mod rng;

pub use card::{generate_deck, BoardSize, Card, PairId, Symbol, SYMBOL_TABLE};
pub use party::{Party, PerParty, Winner};
pub use rng::GameRng;
