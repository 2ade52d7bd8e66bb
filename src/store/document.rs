//! The session document schema.
//!
//! One document per session, shared by both parties. Reads decode
//! through this schema before any game logic sees the data; a document
//! that fails to decode surfaces as [`StoreError::Corrupt`] instead of
//! leaking half-formed values into the state machine.
//!
//! Collection fields default when absent — the store elides empty
//! arrays and null leaves — while structural fields (seats, status,
//! turn) are required.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::core::{BoardSize, Card, PairId, Party, PerParty, Winner};

use super::store::StoreError;

/// One party's seat in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySeat {
    pub id: String,
    #[serde(default)]
    pub ready: bool,
}

impl PartySeat {
    /// Seat for a freshly connected party.
    #[must_use]
    pub fn new(id: impl Into<String>, ready: bool) -> Self {
        Self { id: id.into(), ready }
    }
}

/// Session lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Host alone, waiting for a guest.
    Waiting,
    /// Guest seated; game not yet started.
    Ready,
    /// A game is in progress.
    Playing,
    /// Game over; rematch negotiation may follow.
    Ended,
}

/// The flip-back signal for a rejected pair.
///
/// `stamp` increases monotonically within a session so the remote party
/// can tell a fresh mismatch from one it already animated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRecord {
    pub cards: [usize; 2],
    pub stamp: u64,
}

/// The authoritative session record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionDoc {
    pub host: PartySeat,
    #[serde(default)]
    pub guest: Option<PartySeat>,
    pub status: SessionStatus,
    pub board_size: BoardSize,
    #[serde(default)]
    pub cards: Vec<Card>,
    pub current_turn: Party,
    #[serde(default)]
    pub flipped: SmallVec<[usize; 2]>,
    #[serde(default)]
    pub scores: PerParty<u32>,
    #[serde(default)]
    pub last_mismatch: Option<MismatchRecord>,
    #[serde(default)]
    pub time_remaining: Option<u32>,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default)]
    pub rematch: PerParty<bool>,
    #[serde(default)]
    pub return_lobby: PerParty<bool>,
    #[serde(default)]
    pub presence: PerParty<bool>,
}

impl SessionDoc {
    /// Fresh document for a newly created session.
    #[must_use]
    pub fn new_waiting(host_id: impl Into<String>, board_size: BoardSize) -> Self {
        Self {
            host: PartySeat::new(host_id, true),
            guest: None,
            status: SessionStatus::Waiting,
            board_size,
            cards: Vec::new(),
            current_turn: Party::Host,
            flipped: SmallVec::new(),
            scores: PerParty::default(),
            last_mismatch: None,
            time_remaining: None,
            winner: None,
            rematch: PerParty::default(),
            return_lobby: PerParty::default(),
            presence: PerParty::new(true, false),
        }
    }

    /// Decode a stored document, validating the schema.
    pub fn decode(value: &Value) -> Result<Self, StoreError> {
        serde_json::from_value(value.clone()).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Encode for storage.
    #[must_use]
    pub fn encode(&self) -> Value {
        serde_json::to_value(self).expect("session document serializes")
    }

    /// The seat occupied by `party`, if any.
    #[must_use]
    pub fn seat(&self, party: Party) -> Option<&PartySeat> {
        match party {
            Party::Host => Some(&self.host),
            Party::Guest => self.guest.as_ref(),
        }
    }

    /// Count of resolved pairs.
    #[must_use]
    pub fn matched_pairs(&self) -> u32 {
        (self.cards.iter().filter(|c| c.matched).count() / 2) as u32
    }

    /// Pairs this board holds in total.
    #[must_use]
    pub fn total_pairs(&self) -> u32 {
        (self.cards.len() / 2) as u32
    }

    /// Pair ids currently resolved.
    #[must_use]
    pub fn matched_pair_ids(&self) -> Vec<PairId> {
        let mut ids: Vec<PairId> =
            self.cards.iter().filter(|c| c.matched).map(|c| c.pair_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Whether every pair is resolved.
    #[must_use]
    pub fn board_cleared(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let mut doc = SessionDoc::new_waiting("host_1", BoardSize::Four);
        doc.guest = Some(PartySeat::new("guest_1", false));
        doc.status = SessionStatus::Ready;

        let decoded = SessionDoc::decode(&doc.encode()).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_collections_default_when_absent() {
        let value = json!({
            "host": {"id": "h"},
            "status": "waiting",
            "board_size": 4,
            "current_turn": "host",
        });

        let doc = SessionDoc::decode(&value).unwrap();
        assert!(doc.cards.is_empty());
        assert!(doc.flipped.is_empty());
        assert_eq!(doc.scores, PerParty::default());
        assert!(doc.guest.is_none());
        assert!(!doc.host.ready);
    }

    #[test]
    fn test_missing_structural_field_is_corrupt() {
        let value = json!({
            "host": {"id": "h"},
            "board_size": 4,
            "current_turn": "host",
        });

        assert!(matches!(SessionDoc::decode(&value), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let value = json!({
            "host": {"id": "h"},
            "status": "paused",
            "board_size": 4,
            "current_turn": "host",
        });

        assert!(matches!(SessionDoc::decode(&value), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_matched_pair_accounting() {
        let mut doc = SessionDoc::new_waiting("h", BoardSize::Four);
        doc.cards = crate::core::generate_deck(BoardSize::Four, &mut crate::core::GameRng::new(1));

        assert_eq!(doc.total_pairs(), 8);
        assert_eq!(doc.matched_pairs(), 0);
        assert!(!doc.board_cleared());

        let pair = doc.cards[0].pair_id;
        for card in doc.cards.iter_mut().filter(|c| c.pair_id == pair) {
            card.matched = true;
        }

        assert_eq!(doc.matched_pairs(), 1);
        assert_eq!(doc.matched_pair_ids(), vec![pair]);
    }
}
