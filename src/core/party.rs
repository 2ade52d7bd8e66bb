//! The two party roles and per-party data storage.
//!
//! ## Party
//!
//! A session seats at most two parties: the host, who creates the
//! session and owns host-only responsibilities (starting games, the
//! whole-game clock, deleting the document), and the guest.
//!
//! ## PerParty
//!
//! Two-slot storage indexed by `Party`. Scores, confirmation flags,
//! and presence markers all live in one of these.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two seats in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Host,
    Guest,
}

impl Party {
    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Party {
        match self {
            Party::Host => Party::Guest,
            Party::Guest => Party::Host,
        }
    }

    /// Whether this is the hosting seat.
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Party::Host)
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Host => write!(f, "host"),
            Party::Guest => write!(f, "guest"),
        }
    }
}

/// Per-party data with O(1) access by `Party`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerParty<T> {
    pub host: T,
    pub guest: T,
}

impl<T> PerParty<T> {
    /// Create with explicit values for both seats.
    pub const fn new(host: T, guest: T) -> Self {
        Self { host, guest }
    }

    /// Create with the same value in both seats.
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self { guest: value.clone(), host: value }
    }

    /// Get a reference to one seat's value.
    #[must_use]
    pub fn get(&self, party: Party) -> &T {
        match party {
            Party::Host => &self.host,
            Party::Guest => &self.guest,
        }
    }

    /// Get a mutable reference to one seat's value.
    pub fn get_mut(&mut self, party: Party) -> &mut T {
        match party {
            Party::Host => &mut self.host,
            Party::Guest => &mut self.guest,
        }
    }

    /// Iterate over (Party, &T) pairs, host first.
    pub fn iter(&self) -> impl Iterator<Item = (Party, &T)> {
        [(Party::Host, &self.host), (Party::Guest, &self.guest)].into_iter()
    }
}

impl<T> Index<Party> for PerParty<T> {
    type Output = T;

    fn index(&self, party: Party) -> &Self::Output {
        self.get(party)
    }
}

impl<T> IndexMut<Party> for PerParty<T> {
    fn index_mut(&mut self, party: Party) -> &mut Self::Output {
        self.get_mut(party)
    }
}

/// Outcome of a finished head-to-head game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Host,
    Guest,
    Tie,
}

impl Winner {
    /// Decide the winner by score comparison.
    #[must_use]
    pub fn from_scores(scores: &PerParty<u32>) -> Self {
        use std::cmp::Ordering;
        match scores.host.cmp(&scores.guest) {
            Ordering::Greater => Winner::Host,
            Ordering::Less => Winner::Guest,
            Ordering::Equal => Winner::Tie,
        }
    }

    /// The winning seat, if any.
    #[must_use]
    pub const fn party(self) -> Option<Party> {
        match self {
            Winner::Host => Some(Party::Host),
            Winner::Guest => Some(Party::Guest),
            Winner::Tie => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent() {
        assert_eq!(Party::Host.opponent(), Party::Guest);
        assert_eq!(Party::Guest.opponent(), Party::Host);
        assert_eq!(Party::Host.opponent().opponent(), Party::Host);
    }

    #[test]
    fn test_per_party_indexing() {
        let mut scores: PerParty<u32> = PerParty::default();
        scores[Party::Host] = 3;
        scores[Party::Guest] = 5;

        assert_eq!(scores.host, 3);
        assert_eq!(scores[Party::Guest], 5);
    }

    #[test]
    fn test_per_party_iter() {
        let flags = PerParty::new(true, false);
        let pairs: Vec<_> = flags.iter().collect();
        assert_eq!(pairs, vec![(Party::Host, &true), (Party::Guest, &false)]);
    }

    #[test]
    fn test_winner_from_scores() {
        assert_eq!(Winner::from_scores(&PerParty::new(5, 3)), Winner::Host);
        assert_eq!(Winner::from_scores(&PerParty::new(2, 6)), Winner::Guest);
        assert_eq!(Winner::from_scores(&PerParty::new(4, 4)), Winner::Tie);
    }

    #[test]
    fn test_winner_party() {
        assert_eq!(Winner::Host.party(), Some(Party::Host));
        assert_eq!(Winner::Tie.party(), None);
    }

    #[test]
    fn test_party_serde() {
        let json = serde_json::to_string(&Party::Guest).unwrap();
        assert_eq!(json, "\"guest\"");
        let back: Party = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Party::Guest);
    }
}
