//! The turn/match state machine.
//!
//! One [`GameDriver`] runs a whole session from either seat, in any of
//! the three opponent modes: a remote peer over the shared document, a
//! scripted opponent whose document writes are synthesized locally, or
//! nobody at all (solo against a count-up clock).
//!
//! ## Protocol
//!
//! A party may flip a card only on its own turn, with fewer than two
//! cards face up, at an index that is neither flipped nor matched. The
//! second flip schedules match evaluation after the reveal delay, and
//! only the acting party evaluates and writes the outcome — the remote
//! party learns of it through the document, never by judging the pair
//! itself. A match keeps the turn; a mismatch records a flip-back
//! signal and hands the turn over. A turn timeout is the active
//! party's own problem: it clears its flips and hands over without
//! writing a mismatch record.
//!
//! ## Driving
//!
//! The embedder owns the clock: it calls intent methods and
//! [`advance`] with the current monotonic time in milliseconds, and
//! drains [`drain_events`] after each call. Nothing here blocks,
//! sleeps, or spawns.
//!
//! [`advance`]: GameDriver::advance
//! [`drain_events`]: GameDriver::drain_events

use log::{debug, info, warn};
use serde_json::json;

use crate::core::{generate_deck, BoardSize, GameRng, Party, PerParty, Winner};
use crate::opponent::{Difficulty, OpponentConfig, ScriptedOpponent};
use crate::session::manager::{lobby_patch, start_patch};
use crate::session::{Session, SessionError, SessionSignal};
use crate::store::{DocPatch, MismatchRecord, PartySeat, SessionDoc, SessionStatus};
use crate::timer::{Countdown, Scheduler, TaskId, Tick};

use super::config::{GameConfig, OpponentKind, TimerDiscipline};
use super::event::GameEvent;
use super::reconcile::diff_snapshots;
use super::view::GameView;

/// Milliseconds between clock ticks.
const TICK_MS: u64 = 1000;

/// Who provides the second party's moves.
enum Mode {
    Remote(Session),
    Scripted(ScriptedOpponent),
    Solo,
}

/// Which clock the driver runs.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Discipline {
    CountUp,
    PerTurn,
    WholeGame,
}

/// Scheduled work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    /// Judge the flipped pair after the reveal delay.
    Reveal,
    /// One second elapsed.
    ClockTick,
    /// The scripted opponent picks its first card.
    OpponentFirst,
    /// The scripted opponent picks its second card.
    OpponentSecond { first: usize },
}

/// The unified game state machine.
pub struct GameDriver {
    config: GameConfig,
    local: Party,
    mode: Mode,
    doc: SessionDoc,
    rng: GameRng,
    scheduler: Scheduler<Task>,
    turn_clock: Countdown,
    game_clock: Countdown,
    tick_task: Option<TaskId>,
    next_tick_at: u64,
    reveal_task: Option<TaskId>,
    opponent_task: Option<TaskId>,
    acting: Option<Party>,
    solo_elapsed: u32,
    moves: u32,
    events: Vec<GameEvent>,
}

impl GameDriver {
    /// Solo play: no second party, no countdown, a move counter and an
    /// elapsed-seconds clock.
    #[must_use]
    pub fn solo(config: GameConfig) -> Self {
        let mut doc = SessionDoc::new_waiting("local", config.board_size);
        doc.status = SessionStatus::Ready;
        Self::local(config, Mode::Solo, doc)
    }

    /// Single-player against the scripted opponent at a difficulty
    /// tier.
    #[must_use]
    pub fn scripted(config: GameConfig, difficulty: Difficulty) -> Self {
        Self::scripted_with(config, OpponentConfig::for_difficulty(difficulty))
    }

    /// Single-player against a custom-tuned scripted opponent.
    #[must_use]
    pub fn scripted_with(config: GameConfig, opponent: OpponentConfig) -> Self {
        let mut rng = GameRng::new(config.seed);
        let opponent = ScriptedOpponent::new(opponent, rng.fork());

        let mut doc = SessionDoc::new_waiting("local", config.board_size);
        doc.guest = Some(PartySeat::new("scripted", true));
        doc.status = SessionStatus::Ready;

        let mut driver = Self::local(config, Mode::Scripted(opponent), doc);
        driver.rng = rng;
        driver
    }

    fn local(config: GameConfig, mode: Mode, doc: SessionDoc) -> Self {
        Self {
            local: Party::Host,
            mode,
            doc,
            rng: GameRng::new(config.seed),
            scheduler: Scheduler::new(),
            turn_clock: Countdown::new(config.turn_budget_secs, config.warn_below_secs),
            game_clock: Countdown::new(config.game_budget_secs, config.warn_below_secs),
            tick_task: None,
            next_tick_at: 0,
            reveal_task: None,
            opponent_task: None,
            acting: None,
            solo_elapsed: 0,
            moves: 0,
            events: Vec::new(),
            config,
        }
    }

    /// Head-to-head play over an established session (either seat).
    pub fn remote(config: GameConfig, session: Session) -> Result<Self, SessionError> {
        let doc = session.read_doc()?;
        let local = session.role();
        // Signals queued before this read are at most as fresh as the
        // read itself; the mirror starts from the read.
        while session.poll_signal().is_some() {}
        let mut driver = Self::local(config, Mode::Remote(session), doc);
        driver.local = local;
        Ok(driver)
    }

    /// Which seat this driver plays from.
    #[must_use]
    pub fn local_party(&self) -> Party {
        self.local
    }

    /// Who sits in the second seat.
    #[must_use]
    pub fn opponent_kind(&self) -> OpponentKind {
        match &self.mode {
            Mode::Remote(_) => OpponentKind::Remote,
            Mode::Scripted(_) => OpponentKind::Scripted,
            Mode::Solo => OpponentKind::None,
        }
    }

    /// The room code, when playing remotely.
    #[must_use]
    pub fn session_code(&self) -> Option<&str> {
        match &self.mode {
            Mode::Remote(session) => Some(session.code()),
            _ => None,
        }
    }

    /// The current derived view model.
    #[must_use]
    pub fn view(&self) -> GameView {
        let (remaining, elapsed) = match self.discipline() {
            Discipline::CountUp => (None, Some(self.solo_elapsed)),
            Discipline::PerTurn => {
                let remaining = (self.doc.status == SessionStatus::Playing)
                    .then(|| self.turn_clock.remaining());
                (remaining, None)
            }
            Discipline::WholeGame => (self.doc.time_remaining, None),
        };
        GameView::derive(&self.doc, self.local, remaining, elapsed, self.moves)
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// When the next scheduled task fires, for embedders that sleep
    /// between calls.
    #[must_use]
    pub fn next_wake(&self) -> Option<u64> {
        self.scheduler.next_fire_at()
    }

    /// Pick the board size while in the lobby. Host only.
    pub fn set_board_size(&mut self, size: BoardSize) -> Result<(), SessionError> {
        match &self.mode {
            Mode::Remote(session) => session.set_board_size(size),
            Mode::Scripted(_) | Mode::Solo => {
                if self.doc.status != SessionStatus::Playing {
                    self.doc.board_size = size;
                }
                Ok(())
            }
        }
    }

    /// Flag readiness while in the lobby. Remote guest only.
    pub fn set_ready(&self, ready: bool) -> Result<(), SessionError> {
        match &self.mode {
            Mode::Remote(session) => session.set_ready(ready),
            _ => Ok(()),
        }
    }

    /// Deal a fresh deck and begin play. Remotely this is host-only and
    /// gated on a ready guest; returns whether a game actually started.
    pub fn start_game(&mut self, now: u64) -> Result<bool, SessionError> {
        self.pump(now)?;

        match &mut self.mode {
            Mode::Remote(session) => {
                let deck = generate_deck(self.doc.board_size, &mut self.rng);
                let time = match self.config.timer {
                    TimerDiscipline::WholeGame => Some(self.config.game_budget_secs),
                    TimerDiscipline::PerTurn => None,
                };
                let started = session.start_game(&deck, time)?;
                if started {
                    // Adopt our own write through the normal snapshot path.
                    self.pump(now)?;
                }
                Ok(started)
            }
            Mode::Scripted(_) | Mode::Solo => {
                if self.doc.status == SessionStatus::Playing {
                    return Ok(false);
                }
                self.begin_local_game(now);
                Ok(true)
            }
        }
    }

    /// Flip a card at the local party's request.
    ///
    /// Illegal flips — out of turn, already face up or matched, two
    /// cards pending — are silently ignored; they only arise from
    /// stale UI state.
    pub fn request_flip(&mut self, index: usize, now: u64) -> Result<(), SessionError> {
        self.pump(now)?;

        if !self.can_flip(index) {
            debug!("ignoring flip of card {index}");
            return Ok(());
        }
        self.flip(index, self.local, now)
    }

    /// Ask for a rematch once a game has ended.
    pub fn request_rematch(&mut self, now: u64) -> Result<(), SessionError> {
        self.pump(now)?;
        if self.doc.status != SessionStatus::Ended {
            debug!("ignoring rematch request outside ended state");
            return Ok(());
        }

        match &mut self.mode {
            // The scripted opponent and an empty seat always accept.
            Mode::Scripted(_) | Mode::Solo => {
                self.begin_local_game(now);
                Ok(())
            }
            Mode::Remote(session) => {
                self.doc.rematch[self.local] = true;
                let field = format!("rematch/{}", self.local);
                session.update(DocPatch::new().set(field, true))?;
                self.arbitrate_flags(now)
            }
        }
    }

    /// Ask to return to the waiting room once a game has ended.
    pub fn request_return_lobby(&mut self, now: u64) -> Result<(), SessionError> {
        self.pump(now)?;
        if self.doc.status != SessionStatus::Ended {
            debug!("ignoring lobby request outside ended state");
            return Ok(());
        }

        match &mut self.mode {
            Mode::Scripted(_) | Mode::Solo => {
                self.cancel_tasks();
                self.doc.status = SessionStatus::Ready;
                self.doc.cards.clear();
                self.doc.flipped.clear();
                self.doc.scores = PerParty::default();
                self.doc.last_mismatch = None;
                self.doc.winner = None;
                self.moves = 0;
                self.solo_elapsed = 0;
                self.events.push(GameEvent::ReturnedToLobby);
                Ok(())
            }
            Mode::Remote(session) => {
                self.doc.return_lobby[self.local] = true;
                let field = format!("return_lobby/{}", self.local);
                session.update(DocPatch::new().set(field, true))?;
                self.arbitrate_flags(now)
            }
        }
    }

    /// Process due timers and any pending remote snapshots.
    pub fn advance(&mut self, now: u64) -> Result<(), SessionError> {
        self.pump(now)?;

        while let Some((id, task)) = self.scheduler.pop_due(now) {
            if Some(id) == self.tick_task {
                self.tick_task = None;
            }
            if Some(id) == self.reveal_task {
                self.reveal_task = None;
            }
            if Some(id) == self.opponent_task {
                self.opponent_task = None;
            }

            match task {
                Task::Reveal => self.resolve_pair(now)?,
                Task::ClockTick => self.handle_tick(now)?,
                Task::OpponentFirst => self.handle_opponent_first(now)?,
                Task::OpponentSecond { first } => self.handle_opponent_second(first, now)?,
            }
        }
        Ok(())
    }

    /// Leave the session: cancel all timers and subscriptions, then
    /// tear down the document per role.
    pub fn leave(mut self) -> Result<(), SessionError> {
        self.cancel_tasks();
        match self.mode {
            Mode::Remote(session) => session.leave(),
            Mode::Scripted(_) | Mode::Solo => Ok(()),
        }
    }

    // ---- game start ----

    fn begin_local_game(&mut self, now: u64) {
        let side = self.doc.board_size.side();
        let deck = generate_deck(self.doc.board_size, &mut self.rng);
        info!("starting {side}x{side} game, {} cards", deck.len());

        self.doc.cards = deck;
        self.doc.status = SessionStatus::Playing;
        self.doc.current_turn = Party::Host;
        self.doc.flipped.clear();
        self.doc.scores = PerParty::default();
        self.doc.last_mismatch = None;
        self.doc.winner = None;
        self.doc.rematch = PerParty::default();
        self.doc.return_lobby = PerParty::default();
        self.doc.time_remaining = None;

        if let Mode::Scripted(opponent) = &mut self.mode {
            opponent.reset();
        }

        self.moves = 0;
        self.solo_elapsed = 0;
        self.acting = None;
        self.events.push(GameEvent::GameStarted);
        self.restart_clocks(now);
    }

    // ---- flipping and resolution ----

    fn can_flip(&self, index: usize) -> bool {
        self.doc.status == SessionStatus::Playing
            && self.doc.current_turn == self.local
            && self.doc.flipped.len() < 2
            && !self.doc.flipped.contains(&index)
            && self.doc.cards.get(index).is_some_and(|c| !c.matched)
    }

    fn flip(&mut self, index: usize, by: Party, now: u64) -> Result<(), SessionError> {
        let symbol = self.doc.cards[index].symbol;
        self.doc.flipped.push(index);
        self.events.push(GameEvent::CardFlipped { index, symbol, by });

        if let Mode::Scripted(opponent) = &mut self.mode {
            // The opponent watches every flip, its own included.
            opponent.observe(index, symbol);
        }
        if let Mode::Remote(session) = &self.mode {
            let flipped = serde_json::to_value(&self.doc.flipped).expect("flipped serializes");
            session.update(DocPatch::new().set("flipped", flipped))?;
        }

        if self.doc.flipped.len() == 2 {
            self.acting = Some(by);
            self.reveal_task =
                Some(self.scheduler.schedule(now + self.config.reveal_delay_ms, Task::Reveal));
        }
        Ok(())
    }

    /// Judge the flipped pair. Only the acting party gets here; the
    /// remote party sees the outcome through the document.
    fn resolve_pair(&mut self, now: u64) -> Result<(), SessionError> {
        if self.doc.status != SessionStatus::Playing || self.doc.flipped.len() != 2 {
            return Ok(());
        }
        let (a, b) = (self.doc.flipped[0], self.doc.flipped[1]);
        let acting = self.acting.take().unwrap_or(self.doc.current_turn);
        self.moves += 1;

        if self.doc.cards[a].pair_id == self.doc.cards[b].pair_id {
            self.resolve_match(a, b, acting, now)
        } else {
            self.resolve_mismatch(a, b, acting, now)
        }
    }

    fn resolve_match(
        &mut self,
        a: usize,
        b: usize,
        acting: Party,
        now: u64,
    ) -> Result<(), SessionError> {
        let pair = self.doc.cards[a].pair_id;
        self.doc.cards[a].matched = true;
        self.doc.cards[b].matched = true;
        self.doc.scores[acting] += 1;
        self.doc.flipped.clear();
        self.events.push(GameEvent::MatchFound { pair, cards: [a, b], by: acting });

        if let Mode::Scripted(opponent) = &mut self.mode {
            opponent.forget(a);
            opponent.forget(b);
        }

        let ended = self.doc.board_cleared();
        if ended {
            self.finish_game();
        }

        if let Mode::Remote(session) = &self.mode {
            let mut patch = DocPatch::new()
                .set("cards", serde_json::to_value(&self.doc.cards).expect("cards serialize"))
                .set("scores", serde_json::to_value(self.doc.scores).expect("scores serialize"))
                .set("flipped", json!([]));
            if ended {
                patch = patch.set("status", "ended").set(
                    "winner",
                    serde_json::to_value(self.doc.winner).expect("winner serializes"),
                );
            }
            session.update(patch)?;
        }

        if !ended {
            // Same party continues; fresh turn budget.
            self.reset_turn_clock(now);
            if acting != self.local {
                self.schedule_opponent_move(now);
            }
        }
        Ok(())
    }

    fn resolve_mismatch(
        &mut self,
        a: usize,
        b: usize,
        acting: Party,
        now: u64,
    ) -> Result<(), SessionError> {
        let stamp = self.doc.last_mismatch.map_or(0, |m| m.stamp) + 1;
        let record = MismatchRecord { cards: [a, b], stamp };
        self.doc.last_mismatch = Some(record);
        self.doc.flipped.clear();
        self.events.push(GameEvent::Mismatch { cards: [a, b], by: acting });

        // Solo has no second seat to hand the turn to.
        if !matches!(self.mode, Mode::Solo) {
            self.doc.current_turn = acting.opponent();
            self.events.push(GameEvent::TurnChanged { turn: self.doc.current_turn });
        }

        if let Mode::Remote(session) = &self.mode {
            session.update(
                DocPatch::new()
                    .set("flipped", json!([]))
                    .set(
                        "last_mismatch",
                        serde_json::to_value(record).expect("mismatch serializes"),
                    )
                    .set(
                        "current_turn",
                        serde_json::to_value(self.doc.current_turn).expect("party serializes"),
                    ),
            )?;
        }

        self.reset_turn_clock(now);
        if self.doc.current_turn != self.local {
            self.schedule_opponent_move(now);
        }
        Ok(())
    }

    /// Mark the game over and stop all clocks. Callers write the
    /// document themselves so the end rides the same patch as its
    /// cause.
    fn finish_game(&mut self) {
        let winner = match self.mode {
            Mode::Solo => None,
            _ => Some(Winner::from_scores(&self.doc.scores)),
        };
        self.doc.status = SessionStatus::Ended;
        self.doc.winner = winner;
        self.cancel_tasks();
        info!("game over, winner {winner:?}");
        self.events.push(GameEvent::GameOver { winner });
    }

    // ---- clocks ----

    fn discipline(&self) -> Discipline {
        match self.mode {
            Mode::Solo => Discipline::CountUp,
            Mode::Scripted(_) => Discipline::PerTurn,
            Mode::Remote(_) => match self.config.timer {
                TimerDiscipline::PerTurn => Discipline::PerTurn,
                TimerDiscipline::WholeGame => Discipline::WholeGame,
            },
        }
    }

    /// Whether this seat runs the tick chain at all.
    fn runs_clock(&self) -> bool {
        match self.discipline() {
            Discipline::CountUp | Discipline::PerTurn => true,
            // The whole-game clock is host-authoritative; the guest
            // mirrors ticks from the document.
            Discipline::WholeGame => self.local == Party::Host,
        }
    }

    fn restart_clocks(&mut self, now: u64) {
        self.cancel_tasks();
        self.turn_clock = Countdown::new(self.config.turn_budget_secs, self.config.warn_below_secs);
        self.game_clock = Countdown::new(self.config.game_budget_secs, self.config.warn_below_secs);
        self.ensure_tick(now);
    }

    fn ensure_tick(&mut self, now: u64) {
        if self.tick_task.is_none()
            && self.doc.status == SessionStatus::Playing
            && self.runs_clock()
        {
            self.schedule_tick(now + TICK_MS);
        }
    }

    fn schedule_tick(&mut self, at: u64) {
        self.next_tick_at = at;
        self.tick_task = Some(self.scheduler.schedule(at, Task::ClockTick));
    }

    /// Restore the full turn budget and restart the tick chain, so a
    /// backlog of stale ticks cannot drain a freshly granted turn.
    fn reset_turn_clock(&mut self, now: u64) {
        if self.discipline() != Discipline::PerTurn {
            return;
        }
        if let Some(id) = self.tick_task.take() {
            self.scheduler.cancel(id);
        }
        self.turn_clock.reset();
        if self.doc.status == SessionStatus::Playing {
            self.schedule_tick(now + TICK_MS);
        }
    }

    fn handle_tick(&mut self, now: u64) -> Result<(), SessionError> {
        if self.doc.status != SessionStatus::Playing {
            return Ok(());
        }
        let next = self.next_tick_at + TICK_MS;

        match self.discipline() {
            Discipline::CountUp => {
                self.solo_elapsed += 1;
                self.events.push(GameEvent::TimerTick { seconds: self.solo_elapsed });
                self.schedule_tick(next);
            }
            Discipline::PerTurn => match self.turn_clock.tick() {
                Tick::Running { remaining, warning } => {
                    self.events.push(GameEvent::TimerTick { seconds: remaining });
                    if warning {
                        self.events.push(GameEvent::TimerWarning { seconds: remaining });
                    }
                    self.schedule_tick(next);
                }
                Tick::Expired => self.handle_turn_timeout(now)?,
            },
            Discipline::WholeGame => match self.game_clock.tick() {
                Tick::Running { remaining, warning } => {
                    self.doc.time_remaining = Some(remaining);
                    self.events.push(GameEvent::TimerTick { seconds: remaining });
                    if warning {
                        self.events.push(GameEvent::TimerWarning { seconds: remaining });
                    }
                    if let Mode::Remote(session) = &self.mode {
                        session.update(DocPatch::new().set("time_remaining", remaining))?;
                    }
                    self.schedule_tick(next);
                }
                Tick::Expired => {
                    self.doc.time_remaining = Some(0);
                    self.doc.flipped.clear();
                    self.finish_game();
                    if let Mode::Remote(session) = &self.mode {
                        session.update(
                            DocPatch::new()
                                .set("time_remaining", 0)
                                .set("flipped", json!([]))
                                .set("status", "ended")
                                .set(
                                    "winner",
                                    serde_json::to_value(self.doc.winner)
                                        .expect("winner serializes"),
                                ),
                        )?;
                    }
                }
            },
        }
        Ok(())
    }

    /// The active party's turn budget ran out. Only that party acts:
    /// it clears its own flips and hands the turn over, an implicit
    /// mismatch without a flip-back record.
    fn handle_turn_timeout(&mut self, now: u64) -> Result<(), SessionError> {
        let active = self.doc.current_turn;
        let local_acts = match self.mode {
            Mode::Remote(_) => active == self.local,
            // Both seats are local in scripted mode.
            Mode::Scripted(_) => true,
            Mode::Solo => false,
        };
        if !local_acts {
            // The remote party resolves its own timeout; our clock
            // restarts when the turn change arrives.
            return Ok(());
        }
        debug!("turn timeout for {active}");

        if let Some(id) = self.reveal_task.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.opponent_task.take() {
            self.scheduler.cancel(id);
        }
        self.acting = None;

        self.doc.flipped.clear();
        self.doc.current_turn = active.opponent();
        self.events.push(GameEvent::TurnChanged { turn: self.doc.current_turn });

        if let Mode::Remote(session) = &self.mode {
            session.update(
                DocPatch::new().set("flipped", json!([])).set(
                    "current_turn",
                    serde_json::to_value(self.doc.current_turn).expect("party serializes"),
                ),
            )?;
        }

        self.reset_turn_clock(now);
        if self.doc.current_turn != self.local {
            self.schedule_opponent_move(now);
        }
        Ok(())
    }

    // ---- the scripted opponent's staged move ----

    fn schedule_opponent_move(&mut self, now: u64) {
        if let Mode::Scripted(opponent) = &mut self.mode {
            let delay = opponent.think_delay_ms();
            if let Some(id) = self.opponent_task.take() {
                self.scheduler.cancel(id);
            }
            self.opponent_task = Some(self.scheduler.schedule(now + delay, Task::OpponentFirst));
        }
    }

    fn opponent_may_act(&self) -> bool {
        self.doc.status == SessionStatus::Playing
            && self.doc.current_turn == self.local.opponent()
    }

    fn available_indices(&self) -> Vec<usize> {
        self.doc
            .cards
            .iter()
            .enumerate()
            .filter(|&(i, c)| !c.matched && !self.doc.flipped.contains(&i))
            .map(|(i, _)| i)
            .collect()
    }

    fn handle_opponent_first(&mut self, now: u64) -> Result<(), SessionError> {
        // Re-checked at every suspension point: the human's turn may
        // have begun while the opponent was "thinking".
        if !self.opponent_may_act() || !self.doc.flipped.is_empty() {
            debug!("opponent first pick aborted");
            return Ok(());
        }

        let available = self.available_indices();
        let choice = match &mut self.mode {
            Mode::Scripted(opponent) => opponent.choose_first(&available),
            _ => None,
        };
        let Some(index) = choice else {
            return Ok(());
        };

        self.flip(index, self.local.opponent(), now)?;

        let delay = match &mut self.mode {
            Mode::Scripted(opponent) => opponent.think_delay_ms(),
            _ => return Ok(()),
        };
        self.opponent_task =
            Some(self.scheduler.schedule(now + delay, Task::OpponentSecond { first: index }));
        Ok(())
    }

    fn handle_opponent_second(&mut self, first: usize, now: u64) -> Result<(), SessionError> {
        if !self.opponent_may_act() || self.doc.flipped.as_slice() != &[first] {
            debug!("opponent second pick aborted");
            return Ok(());
        }

        let symbol = self.doc.cards[first].symbol;
        let available = self.available_indices();
        let choice = match &mut self.mode {
            Mode::Scripted(opponent) => opponent.choose_second(first, symbol, &available),
            _ => None,
        };
        let Some(index) = choice else {
            return Ok(());
        };

        self.flip(index, self.local.opponent(), now)
    }

    // ---- remote snapshot handling ----

    /// Drain pending session signals into the local mirror.
    fn pump(&mut self, now: u64) -> Result<(), SessionError> {
        loop {
            let signal = match &self.mode {
                Mode::Remote(session) => session.poll_signal(),
                _ => return Ok(()),
            };
            match signal {
                None => return Ok(()),
                Some(SessionSignal::Snapshot(doc)) => self.apply_snapshot(doc, now)?,
                Some(SessionSignal::Corrupt(reason)) => {
                    // Recoverable: the next good snapshot re-derives
                    // everything.
                    warn!("ignoring corrupt snapshot: {reason}");
                }
                Some(SessionSignal::Closed) => {
                    self.handle_closed();
                    return Ok(());
                }
            }
        }
    }

    fn apply_snapshot(&mut self, new: SessionDoc, now: u64) -> Result<(), SessionError> {
        let diff = diff_snapshots(&self.doc, &new, self.local, self.config.warn_below_secs);
        self.doc = new;
        self.events.extend(diff.events);

        if diff.game_started {
            self.moves = 0;
            self.acting = None;
            self.restart_clocks(now);
        } else if diff.turn_changed {
            // The remote party resolved; anything we had in flight is
            // stale.
            if let Some(id) = self.reveal_task.take() {
                self.scheduler.cancel(id);
            }
            self.acting = None;
            self.reset_turn_clock(now);
        }

        if diff.game_ended || diff.returned_to_lobby {
            self.cancel_tasks();
        }
        if diff.returned_to_lobby {
            self.moves = 0;
        }

        self.arbitrate_flags(now)
    }

    /// Host-only arbitration of the rematch/return negotiations: the
    /// guest signals through its flag, the host performs the restart,
    /// so only one party ever writes the new board.
    fn arbitrate_flags(&mut self, now: u64) -> Result<(), SessionError> {
        if self.local != Party::Host || self.doc.status != SessionStatus::Ended {
            return Ok(());
        }
        let Mode::Remote(session) = &mut self.mode else {
            return Ok(());
        };

        if self.doc.rematch.host && self.doc.rematch.guest {
            info!("both parties confirmed rematch");
            let deck = generate_deck(self.doc.board_size, &mut self.rng);
            let time = match self.config.timer {
                TimerDiscipline::WholeGame => Some(self.config.game_budget_secs),
                TimerDiscipline::PerTurn => None,
            };
            session.update(start_patch(&deck, time))?;
            self.pump(now)?;
        } else if self.doc.return_lobby.host && self.doc.return_lobby.guest {
            info!("both parties confirmed return to lobby");
            session.update(lobby_patch())?;
            self.pump(now)?;
        }
        Ok(())
    }

    /// The document vanished under us: the host is gone.
    fn handle_closed(&mut self) {
        if self.local == Party::Host {
            return;
        }
        info!("session closed by host");
        self.cancel_tasks();
        self.doc.status = SessionStatus::Ended;
        self.events.push(GameEvent::SessionClosed);
    }

    fn cancel_tasks(&mut self) {
        if let Some(id) = self.tick_task.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.reveal_task.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.opponent_task.take() {
            self.scheduler.cancel(id);
        }
        self.acting = None;
    }
}

impl std::fmt::Debug for GameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDriver")
            .field("local", &self.local)
            .field("status", &self.doc.status)
            .field("moves", &self.moves)
            .finish()
    }
}
