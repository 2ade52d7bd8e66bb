//! Two-party turn/match protocol tests.
//!
//! Both drivers replicate one session through the in-process store;
//! every assertion below holds on both ends after each party drains
//! its snapshots.

use pair_duel::{
    BoardSize, DocPatch, GameConfig, GameDriver, GameEvent, GameRng, GameView, MemoryStore,
    Party, Session, SessionStatus, SessionStore, Winner,
};

/// Host and guest drivers over a freshly started 4x4 game.
fn remote_pair(seed: u64) -> (GameDriver, GameDriver, MemoryStore) {
    let store = MemoryStore::new();
    let mut rng = GameRng::new(seed);
    let host_session =
        Session::create(Box::new(store.client()), "host_1", BoardSize::Four, &mut rng).unwrap();
    let code = host_session.code().to_string();
    let guest_session = Session::join(Box::new(store.client()), &code, "guest_1").unwrap();
    guest_session.set_ready(true).unwrap();

    let config = GameConfig::default().with_reveal_delay_ms(0);
    let mut host = GameDriver::remote(config.with_seed(seed), host_session).unwrap();
    let mut guest = GameDriver::remote(config.with_seed(seed + 1), guest_session).unwrap();

    assert!(host.start_game(0).unwrap());
    guest.advance(0).unwrap();
    host.drain_events();
    guest.drain_events();
    (host, guest, store)
}

/// Two face-down indices carrying the same pair id.
fn unmatched_pair(view: &GameView) -> (usize, usize) {
    for i in 0..view.cards.len() {
        if view.cards[i].matched || view.flipped.contains(&i) {
            continue;
        }
        for j in i + 1..view.cards.len() {
            if !view.cards[j].matched && view.cards[j].pair_id == view.cards[i].pair_id {
                return (i, j);
            }
        }
    }
    panic!("no unmatched pair left");
}

/// Two face-down indices carrying different pair ids.
fn mismatched_indices(view: &GameView) -> (usize, usize) {
    for i in 0..view.cards.len() {
        if view.cards[i].matched {
            continue;
        }
        for j in i + 1..view.cards.len() {
            if !view.cards[j].matched && view.cards[j].pair_id != view.cards[i].pair_id {
                return (i, j);
            }
        }
    }
    panic!("no mismatch available");
}

#[test]
fn test_mismatch_hands_turn_over() {
    let (mut host, mut guest, _store) = remote_pair(7);
    let (a, b) = mismatched_indices(&host.view());

    host.request_flip(a, 10).unwrap();
    host.request_flip(b, 20).unwrap();
    host.advance(20).unwrap();

    let hv = host.view();
    assert!(hv.flipped.is_empty());
    assert_eq!(hv.current_turn, Party::Guest);
    assert_eq!(hv.scores.host + hv.scores.guest, 0);

    guest.advance(20).unwrap();
    let gv = guest.view();
    assert_eq!(gv.current_turn, Party::Guest);
    assert!(gv.is_local_turn);
    assert!(gv.flipped.is_empty());

    // The guest animates both flips, the flip-back, and the handoff.
    let events = guest.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::CardFlipped { index, by: Party::Host, .. } if *index == a)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::CardFlipped { index, by: Party::Host, .. } if *index == b)));
    assert!(events.contains(&GameEvent::FlipBack { cards: [a, b] }));
    assert!(events.contains(&GameEvent::TurnChanged { turn: Party::Guest }));

    // The host already animated its own mismatch; no flip-back echo.
    assert!(!host.drain_events().iter().any(|e| matches!(e, GameEvent::FlipBack { .. })));
}

#[test]
fn test_match_keeps_turn_and_scores() {
    let (mut host, mut guest, _store) = remote_pair(9);

    // Hand the turn to the guest with a deliberate mismatch.
    let (a, b) = mismatched_indices(&host.view());
    host.request_flip(a, 10).unwrap();
    host.request_flip(b, 20).unwrap();
    host.advance(20).unwrap();
    guest.advance(20).unwrap();
    host.drain_events();
    guest.drain_events();

    let (c, d) = unmatched_pair(&guest.view());
    guest.request_flip(c, 100).unwrap();
    guest.request_flip(d, 110).unwrap();
    guest.advance(110).unwrap();
    host.advance(110).unwrap();

    for view in [host.view(), guest.view()] {
        assert_eq!(view.scores.guest, 1);
        assert_eq!(view.scores.host, 0);
        assert!(view.cards[c].matched);
        assert!(view.cards[d].matched);
        // Turn is unchanged after a resolved match.
        assert_eq!(view.current_turn, Party::Guest);
    }

    let events = host.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::MatchFound { by: Party::Guest, .. })));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::TurnChanged { .. })));
}

#[test]
fn test_out_of_turn_flip_is_ignored() {
    let (mut host, mut guest, _store) = remote_pair(11);

    guest.request_flip(0, 10).unwrap();

    assert!(guest.view().flipped.is_empty());
    host.advance(20).unwrap();
    assert!(host.view().flipped.is_empty());
    assert!(!host
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::CardFlipped { .. })));
}

#[test]
fn test_host_sweeps_board_to_victory() {
    let (mut host, mut guest, _store) = remote_pair(3);

    let mut now = 0;
    let mut resolved = 0;
    while host.view().status == SessionStatus::Playing {
        assert!(resolved < 8, "game did not end after all pairs");
        let (a, b) = unmatched_pair(&host.view());

        now += 10;
        host.request_flip(a, now).unwrap();
        assert!(host.view().flipped.len() <= 2);
        now += 10;
        host.request_flip(b, now).unwrap();
        assert_eq!(host.view().flipped.len(), 2);

        host.advance(now).unwrap();
        guest.advance(now).unwrap();
        resolved += 1;

        // Score sum tracks resolved pairs exactly.
        let view = host.view();
        assert_eq!(view.scores.host + view.scores.guest, resolved);
        assert_eq!(guest.view().scores, view.scores);
    }

    assert_eq!(resolved, 8);
    for view in [host.view(), guest.view()] {
        assert_eq!(view.status, SessionStatus::Ended);
        assert_eq!(view.winner, Some(Winner::Host));
        assert_eq!(view.scores.host, 8);
        assert_eq!(view.matched_pair_ids.len(), 8);
    }
    assert!(guest
        .drain_events()
        .contains(&GameEvent::GameOver { winner: Some(Winner::Host) }));
}

#[test]
fn test_conflicting_turn_claims_converge() {
    // Known race, pinned rather than resolved: if both clients
    // momentarily believe it is their turn, the turn field converges
    // to the last write on the next snapshot.
    let (mut host, mut guest, store) = remote_pair(5);
    let code = host.session_code().unwrap().to_string();

    let writer = store.client();
    writer.update(&code, DocPatch::new().set("current_turn", "guest")).unwrap();
    writer.update(&code, DocPatch::new().set("current_turn", "host")).unwrap();

    host.advance(50).unwrap();
    guest.advance(50).unwrap();

    assert_eq!(host.view().current_turn, Party::Host);
    assert_eq!(guest.view().current_turn, Party::Host);
    assert!(host.view().is_local_turn);
    assert!(!guest.view().is_local_turn);
}

#[test]
fn test_corrupt_snapshot_is_skipped_not_fatal() {
    let (mut host, mut guest, store) = remote_pair(13);
    let code = host.session_code().unwrap().to_string();

    // A write the schema rejects reaches both subscribers.
    let writer = store.client();
    writer.update(&code, DocPatch::new().set("status", "paused")).unwrap();
    host.advance(10).unwrap();
    guest.advance(10).unwrap();

    // Both stay on their last good mirror.
    assert_eq!(host.view().status, SessionStatus::Playing);
    assert_eq!(guest.view().status, SessionStatus::Playing);

    // Restore and keep playing.
    writer.update(&code, DocPatch::new().set("status", "playing")).unwrap();
    let (a, b) = unmatched_pair(&host.view());
    host.request_flip(a, 20).unwrap();
    host.request_flip(b, 30).unwrap();
    host.advance(30).unwrap();
    guest.advance(30).unwrap();

    assert_eq!(guest.view().scores.host, 1);
}
