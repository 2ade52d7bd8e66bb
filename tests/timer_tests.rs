//! Clock discipline tests: per-turn expiry, whole-game expiry, reset
//! points, and cancellation on every exit path.

use pair_duel::{
    BoardSize, GameConfig, GameDriver, GameEvent, GameRng, GameView, MemoryStore, Party,
    Session, SessionStatus, TimerDiscipline, Winner,
};

/// Host and guest drivers over a freshly started game.
fn remote_pair(config: GameConfig) -> (GameDriver, GameDriver) {
    let store = MemoryStore::new();
    let mut rng = GameRng::new(config.seed);
    let host_session =
        Session::create(Box::new(store.client()), "host_1", BoardSize::Four, &mut rng).unwrap();
    let code = host_session.code().to_string();
    let guest_session = Session::join(Box::new(store.client()), &code, "guest_1").unwrap();
    guest_session.set_ready(true).unwrap();

    let mut host = GameDriver::remote(config, host_session).unwrap();
    let mut guest = GameDriver::remote(config, guest_session).unwrap();
    assert!(host.start_game(0).unwrap());
    guest.advance(0).unwrap();
    host.drain_events();
    guest.drain_events();
    (host, guest)
}

/// Two face-down indices with the same pair id.
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

#[test]
fn test_turn_timeout_switches_without_mismatch_record() {
    let config = GameConfig::default()
        .with_reveal_delay_ms(0)
        .with_turn_budget_secs(3)
        .with_seed(31);
    let (mut host, mut guest) = remote_pair(config);

    // One card face up when the budget runs out.
    host.request_flip(0, 10).unwrap();
    host.advance(10_000).unwrap();

    let hv = host.view();
    assert!(hv.flipped.is_empty());
    assert_eq!(hv.current_turn, Party::Guest);

    let host_events = host.drain_events();
    assert!(host_events.contains(&GameEvent::TurnChanged { turn: Party::Guest }));
    assert!(host_events.contains(&GameEvent::TimerWarning { seconds: 1 }));
    // A timeout is not a mismatch: nothing to flip back remotely.
    assert!(!host_events.iter().any(|e| matches!(e, GameEvent::Mismatch { .. })));

    guest.advance(10_000).unwrap();
    let gv = guest.view();
    assert!(gv.flipped.is_empty());
    assert!(gv.is_local_turn);

    let guest_events = guest.drain_events();
    assert!(guest_events.contains(&GameEvent::TurnChanged { turn: Party::Guest }));
    assert!(!guest_events.iter().any(|e| matches!(e, GameEvent::FlipBack { .. })));

    // The freshly granted turn starts with a full budget, not the
    // other party's drained one.
    assert_eq!(gv.seconds_remaining, Some(3));
}

#[test]
fn test_per_turn_clock_resets_on_match() {
    let config = GameConfig::default()
        .with_reveal_delay_ms(0)
        .with_turn_budget_secs(3)
        .with_seed(32);
    let (mut host, _guest) = remote_pair(config);

    // Two seconds of the budget are gone when the pair resolves.
    host.advance(2_000).unwrap();
    let (a, b) = unmatched_pair(&host.view());
    host.request_flip(a, 2_100).unwrap();
    host.request_flip(b, 2_200).unwrap();
    host.advance(2_200).unwrap();
    host.drain_events();

    // Three seconds after the old turn began, the reset clock is
    // still running.
    host.advance(3_100).unwrap();
    assert_eq!(host.view().current_turn, Party::Host);
    assert!(!host
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::TurnChanged { .. })));

    // It expires a full budget after the match instead.
    host.advance(5_500).unwrap();
    assert_eq!(host.view().current_turn, Party::Guest);
}

#[test]
fn test_whole_game_expiry_decides_by_score() {
    let config = GameConfig::default()
        .with_reveal_delay_ms(0)
        .with_timer(TimerDiscipline::WholeGame)
        .with_game_budget_secs(5)
        .with_seed(33);
    let (mut host, mut guest) = remote_pair(config);

    // Host banks one pair, then both sides idle until the clock dies.
    let (a, b) = unmatched_pair(&host.view());
    host.request_flip(a, 10).unwrap();
    host.request_flip(b, 20).unwrap();
    host.advance(20).unwrap();
    assert_eq!(host.view().scores.host, 1);

    host.advance(10_000).unwrap();
    guest.advance(10_000).unwrap();

    for view in [host.view(), guest.view()] {
        assert_eq!(view.status, SessionStatus::Ended);
        assert_eq!(view.winner, Some(Winner::Host));
        assert_eq!(view.seconds_remaining, Some(0));
    }

    // The guest mirrored the host's ticks rather than running a clock
    // of its own.
    let guest_events = guest.drain_events();
    let ticks: Vec<u32> = guest_events
        .iter()
        .filter_map(|e| match e {
            GameEvent::TimerTick { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![4, 3, 2, 1, 0]);
    assert!(guest_events.contains(&GameEvent::GameOver { winner: Some(Winner::Host) }));
}

#[test]
fn test_clock_stops_at_game_end() {
    let config = GameConfig::default()
        .with_timer(TimerDiscipline::WholeGame)
        .with_game_budget_secs(2)
        .with_seed(34);
    let (mut host, mut guest) = remote_pair(config);

    host.advance(5_000).unwrap();
    guest.advance(5_000).unwrap();
    assert_eq!(host.view().status, SessionStatus::Ended);
    host.drain_events();
    guest.drain_events();

    // Long after the end, no orphaned timer is still ticking.
    host.advance(60_000).unwrap();
    guest.advance(60_000).unwrap();
    assert!(!host.drain_events().iter().any(|e| matches!(e, GameEvent::TimerTick { .. })));
    assert!(!guest.drain_events().iter().any(|e| matches!(e, GameEvent::TimerTick { .. })));
}

#[test]
fn test_clock_stops_when_session_closes() {
    let config = GameConfig::default().with_turn_budget_secs(3).with_seed(35);
    let (host, mut guest) = remote_pair(config);

    host.leave().unwrap();
    guest.advance(1_500).unwrap();
    assert!(guest.drain_events().contains(&GameEvent::SessionClosed));

    guest.advance(60_000).unwrap();
    let events = guest.drain_events();
    assert!(!events.iter().any(|e| matches!(e, GameEvent::TimerTick { .. })));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::TurnChanged { .. })));
}
