//! Remote snapshot reconciliation.
//!
//! Each party subscribes to the shared document and diffs every
//! incoming snapshot against its local mirror to drive the UI. The
//! reader never re-validates legality — the writer already did — it
//! only derives what changed: fresh flips, resolved pairs, a mismatch
//! to flip back, a turn handoff, clock movement, lifecycle
//! transitions.
//!
//! The local party's own writes update the mirror at write time, so
//! their echoes diff to nothing here.

use crate::core::Party;
use crate::store::{SessionDoc, SessionStatus};

use super::event::GameEvent;

/// What a snapshot changed, as events plus control flags the driver
/// acts on (clock resets, task cancellation).
#[derive(Debug, Default)]
pub struct SnapshotDiff {
    pub events: Vec<GameEvent>,
    /// The turn moved; reset the per-turn clock.
    pub turn_changed: bool,
    /// A fresh board went live; reset clocks and counters.
    pub game_started: bool,
    /// The game ended; cancel outstanding work.
    pub game_ended: bool,
    /// The session returned to the waiting room.
    pub returned_to_lobby: bool,
}

/// Diff an incoming snapshot against the local mirror.
#[must_use]
pub fn diff_snapshots(
    old: &SessionDoc,
    new: &SessionDoc,
    local: Party,
    warn_below: u32,
) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();

    if old.guest.is_none() && new.guest.is_some() {
        diff.events.push(GameEvent::OpponentJoined);
    }
    if old.guest.is_some() && new.guest.is_none() {
        diff.events.push(GameEvent::OpponentLeft);
    }

    let started =
        old.status != SessionStatus::Playing && new.status == SessionStatus::Playing;
    if started {
        diff.game_started = true;
        diff.events.push(GameEvent::GameStarted);
    }

    // Per-move diffs only make sense over a continuous board; a start
    // replaced the deck wholesale.
    if !started {
        for &index in &new.flipped {
            if !old.flipped.contains(&index) {
                if let Some(card) = new.cards.get(index) {
                    diff.events.push(GameEvent::CardFlipped {
                        index,
                        symbol: card.symbol,
                        by: new.current_turn,
                    });
                }
            }
        }

        let old_matched = old.matched_pair_ids();
        for pair in new.matched_pair_ids() {
            if !old_matched.contains(&pair) {
                let cards = pair_indices(new, pair);
                diff.events.push(GameEvent::MatchFound { pair, cards, by: old.current_turn });
            }
        }

        let old_stamp = old.last_mismatch.map(|m| m.stamp);
        if let Some(record) = new.last_mismatch {
            // Flip back only when the remote party resolved it; our own
            // mismatches already animated locally.
            if old_stamp != Some(record.stamp) && old.current_turn != local {
                diff.events.push(GameEvent::FlipBack { cards: record.cards });
            }
        }
    }

    if old.current_turn != new.current_turn {
        diff.turn_changed = true;
        diff.events.push(GameEvent::TurnChanged { turn: new.current_turn });
    }

    // Guarded on the old status so the initial budget written by a
    // game start is not a tick, while the final tick that rides the
    // ending snapshot still is.
    if old.status == SessionStatus::Playing && new.time_remaining != old.time_remaining {
        if let Some(seconds) = new.time_remaining {
            diff.events.push(GameEvent::TimerTick { seconds });
            if seconds > 0 && seconds <= warn_below {
                diff.events.push(GameEvent::TimerWarning { seconds });
            }
        }
    }

    for (party, &requested) in new.rematch.iter() {
        if requested && !old.rematch[party] && party != local {
            diff.events.push(GameEvent::RematchRequested { by: party });
        }
    }

    if old.status != SessionStatus::Ended && new.status == SessionStatus::Ended {
        diff.game_ended = true;
        diff.events.push(GameEvent::GameOver { winner: new.winner });
    }

    if old.status == SessionStatus::Ended && new.status == SessionStatus::Waiting {
        diff.returned_to_lobby = true;
        diff.events.push(GameEvent::ReturnedToLobby);
    }

    diff
}

/// Both board indices of a pair.
fn pair_indices(doc: &SessionDoc, pair: crate::core::PairId) -> [usize; 2] {
    let mut found = [0usize; 2];
    let mut n = 0;
    for (i, card) in doc.cards.iter().enumerate() {
        if card.pair_id == pair && n < 2 {
            found[n] = i;
            n += 1;
        }
    }
    found
}
