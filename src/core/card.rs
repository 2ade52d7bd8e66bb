//! Cards, symbols, and paired-deck generation.
//!
//! A deck is a flat, shuffled sequence of cards; a card's identity is
//! its index in that sequence. Every pair id appears on exactly two
//! cards, and a board size decides how many pairs are dealt.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;

/// Glyphs a symbol id renders as. Board sizes draw a random subset.
pub const SYMBOL_TABLE: [&str; 32] = [
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼",
    "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🐔",
    "🦄", "🐝", "🦋", "🐢", "🐙", "🦀", "🐬", "🦈",
    "🌸", "🌺", "🌻", "🌹", "🍎", "🍊", "🍋", "🍇",
];

/// Symbol identifier indexing into [`SYMBOL_TABLE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub u8);

impl Symbol {
    /// Create a new symbol id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// The glyph this symbol renders as.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        SYMBOL_TABLE[self.0 as usize % SYMBOL_TABLE.len()]
    }
}

/// Pair identifier, dense in `0..pair_count` for a generated deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(pub u8);

impl PairId {
    /// Create a new pair id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

/// One card in the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub symbol: Symbol,
    pub pair_id: PairId,
    #[serde(default)]
    pub matched: bool,
}

impl Card {
    /// Create a face-down, unmatched card.
    #[must_use]
    pub const fn new(symbol: Symbol, pair_id: PairId) -> Self {
        Self { symbol, pair_id, matched: false }
    }
}

/// Supported square board sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BoardSize {
    Four,
    Six,
}

impl BoardSize {
    /// Cards per side.
    #[must_use]
    pub const fn side(self) -> usize {
        match self {
            BoardSize::Four => 4,
            BoardSize::Six => 6,
        }
    }

    /// Total cards on the board.
    #[must_use]
    pub const fn card_count(self) -> usize {
        self.side() * self.side()
    }

    /// Number of pairs dealt.
    #[must_use]
    pub const fn pair_count(self) -> usize {
        self.card_count() / 2
    }
}

impl TryFrom<u8> for BoardSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(BoardSize::Four),
            6 => Ok(BoardSize::Six),
            other => Err(format!("unsupported board size {other}")),
        }
    }
}

impl From<BoardSize> for u8 {
    fn from(size: BoardSize) -> u8 {
        size.side() as u8
    }
}

/// Generate a shuffled deck for the given board size.
///
/// Picks `pair_count` distinct symbols at random, lays out two cards
/// per pair, and shuffles the result in place.
#[must_use]
pub fn generate_deck(size: BoardSize, rng: &mut GameRng) -> Vec<Card> {
    let mut symbol_ids: Vec<u8> = (0..SYMBOL_TABLE.len() as u8).collect();
    rng.shuffle(&mut symbol_ids);

    let mut deck = Vec::with_capacity(size.card_count());
    for (pair, &symbol_id) in symbol_ids.iter().take(size.pair_count()).enumerate() {
        let card = Card::new(Symbol::new(symbol_id), PairId::new(pair as u8));
        deck.push(card);
        deck.push(card);
    }

    rng.shuffle(&mut deck);
    deck
}
