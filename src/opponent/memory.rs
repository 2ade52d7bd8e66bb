//! The opponent's simulated card memory.
//!
//! Two views of the same observations: card index → symbol, and
//! symbol → set of indices known to carry it. Retention is decided by
//! the caller (it is probabilistic, per the difficulty profile); once
//! something is stored here it is never spontaneously forgotten, only
//! removed when its pair resolves.

use im::HashSet as ImHashSet;
use rustc_hash::FxHashMap;

use crate::core::Symbol;

/// Partial mapping of board positions to observed symbols.
#[derive(Clone, Debug, Default)]
pub struct OpponentMemory {
    by_index: FxHashMap<usize, Symbol>,
    by_symbol: FxHashMap<Symbol, ImHashSet<usize>>,
}

impl OpponentMemory {
    /// Create an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `index` carries `symbol`.
    pub fn remember(&mut self, index: usize, symbol: Symbol) {
        self.by_index.insert(index, symbol);
        self.by_symbol.entry(symbol).or_default().insert(index);
    }

    /// Drop everything known about `index`.
    pub fn forget(&mut self, index: usize) {
        if let Some(symbol) = self.by_index.remove(&index) {
            if let Some(indices) = self.by_symbol.get_mut(&symbol) {
                indices.remove(&index);
                if indices.is_empty() {
                    self.by_symbol.remove(&symbol);
                }
            }
        }
    }

    /// Clear all observations.
    pub fn clear(&mut self) {
        self.by_index.clear();
        self.by_symbol.clear();
    }

    /// The symbol observed at `index`, if retained.
    #[must_use]
    pub fn symbol_at(&self, index: usize) -> Option<Symbol> {
        self.by_index.get(&index).copied()
    }

    /// Indices known to carry `symbol`.
    #[must_use]
    pub fn indices_of(&self, symbol: Symbol) -> Option<&ImHashSet<usize>> {
        self.by_symbol.get(&symbol)
    }

    /// Symbols with at least two retained indices among `available`,
    /// with those indices, in ascending symbol order so choice is
    /// deterministic for a given memory state.
    #[must_use]
    pub fn known_pairs(&self, available: &[usize]) -> Vec<(Symbol, Vec<usize>)> {
        let mut pairs: Vec<(Symbol, Vec<usize>)> = self
            .by_symbol
            .iter()
            .filter_map(|(&symbol, indices)| {
                let mut live: Vec<usize> =
                    indices.iter().copied().filter(|i| available.contains(i)).collect();
                if live.len() >= 2 {
                    live.sort_unstable();
                    Some((symbol, live))
                } else {
                    None
                }
            })
            .collect();
        pairs.sort_unstable_by_key(|(symbol, _)| symbol.0);
        pairs
    }

    /// A retained partner of `symbol` among `available`, excluding
    /// `except`. Consults the symbol map first, then scans raw
    /// observations.
    #[must_use]
    pub fn partner_of(&self, symbol: Symbol, except: usize, available: &[usize]) -> Option<usize> {
        if let Some(indices) = self.by_symbol.get(&symbol) {
            let mut live: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| i != except && available.contains(&i))
                .collect();
            live.sort_unstable();
            if let Some(&found) = live.first() {
                return Some(found);
            }
        }

        self.by_index
            .iter()
            .filter(|&(&i, &s)| s == symbol && i != except && available.contains(&i))
            .map(|(&i, _)| i)
            .min()
    }

    /// Number of retained observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}
