//! Session creation, joining, leaving, and snapshot delivery.
//!
//! A [`Session`] is one party's handle on the shared document: it owns
//! the store connection, the live subscription, and the receiving end
//! of a signal channel that decoded snapshots arrive on. The embedder
//! (or the game driver) drains signals with [`poll_signal`] on its own
//! schedule; no callback ever reaches game logic directly.
//!
//! Disconnect handling is armed at the store, not polled: the host's
//! ungraceful exit deletes the document (ending the session for the
//! guest, observed as document-absent), the guest's clears the guest
//! seat and returns the session to `waiting`.
//!
//! [`poll_signal`]: Session::poll_signal

use log::{debug, info};
use serde_json::json;
use std::sync::mpsc;

use crate::core::{BoardSize, Card, GameRng, Party};
use crate::store::{
    DisconnectAction, DocPatch, SessionDoc, SessionStatus, SessionStore, StoreError,
    Subscription,
};

use super::code::generate_code;
use super::error::SessionError;

/// Bound on code regeneration so a saturated code space fails the
/// create instead of hanging it.
const CODE_RETRIES: usize = 64;

/// What the document subscription delivers.
#[derive(Debug)]
pub enum SessionSignal {
    /// A decoded snapshot of the latest document state.
    Snapshot(SessionDoc),
    /// The document exists but failed to decode; re-derive from the
    /// next good snapshot.
    Corrupt(String),
    /// The document no longer exists.
    Closed,
}

/// One party's live connection to a session.
pub struct Session {
    store: Box<dyn SessionStore>,
    code: String,
    role: Party,
    signals: mpsc::Receiver<SessionSignal>,
    subscription: Option<Subscription>,
}

impl Session {
    /// Create a session as host.
    ///
    /// Draws 5-digit codes until one is free (bounded retries), writes
    /// the initial `waiting` document, arms document deletion on
    /// disconnect, and subscribes.
    pub fn create(
        store: Box<dyn SessionStore>,
        host_id: &str,
        board_size: BoardSize,
        rng: &mut GameRng,
    ) -> Result<Self, SessionError> {
        let doc = SessionDoc::new_waiting(host_id, board_size);

        let mut code = None;
        for _ in 0..CODE_RETRIES {
            let candidate = generate_code(rng);
            match store.create(&candidate, doc.encode()) {
                Ok(()) => {
                    code = Some(candidate);
                    break;
                }
                Err(StoreError::AlreadyExists) => {
                    debug!("room code {candidate} taken, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        let code = code.ok_or_else(|| {
            StoreError::Unavailable(format!("no free room code after {CODE_RETRIES} tries"))
        })?;

        store.arm_on_disconnect(&code, vec![DisconnectAction::DeleteDocument])?;

        let (subscription, signals) = subscribe_signals(store.as_ref(), &code)?;
        info!("session {code} created as host");

        Ok(Self { store, code, role: Party::Host, signals, subscription: Some(subscription) })
    }

    /// Join an existing session as guest.
    ///
    /// Checks, in document-read order: `NotFound` when no document,
    /// `Full` when the guest seat is taken, `AlreadyStarted` when the
    /// session left the waiting state. Then claims the seat, arms
    /// seat-clearing on disconnect, and subscribes.
    pub fn join(
        store: Box<dyn SessionStore>,
        code: &str,
        guest_id: &str,
    ) -> Result<Self, SessionError> {
        let value = store.read(code)?.ok_or(SessionError::NotFound)?;
        let doc = SessionDoc::decode(&value)?;

        if doc.guest.is_some() {
            return Err(SessionError::Full);
        }
        if doc.status != SessionStatus::Waiting {
            return Err(SessionError::AlreadyStarted);
        }

        store.update(
            code,
            DocPatch::new()
                .set("guest", json!({ "id": guest_id, "ready": false }))
                .set("status", "ready")
                .set("presence/guest", true),
        )?;

        store.arm_on_disconnect(
            code,
            vec![
                DisconnectAction::RemoveField("guest".into()),
                DisconnectAction::SetField("status".into(), json!("waiting")),
                DisconnectAction::SetField("presence/guest".into(), json!(false)),
            ],
        )?;

        let (subscription, signals) = subscribe_signals(store.as_ref(), code)?;
        info!("session {code} joined as guest");

        Ok(Self {
            store,
            code: code.to_string(),
            role: Party::Guest,
            signals,
            subscription: Some(subscription),
        })
    }

    /// The 5-digit room code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Which seat this handle occupies.
    #[must_use]
    pub fn role(&self) -> Party {
        self.role
    }

    /// Next pending signal, if any. Never blocks.
    #[must_use]
    pub fn poll_signal(&self) -> Option<SessionSignal> {
        self.signals.try_recv().ok()
    }

    /// Read and decode the current document.
    pub fn read_doc(&self) -> Result<SessionDoc, SessionError> {
        let value = self.store.read(&self.code)?.ok_or(SessionError::Closed)?;
        Ok(SessionDoc::decode(&value)?)
    }

    /// Merge a partial update into the document.
    pub fn update(&self, patch: DocPatch) -> Result<(), SessionError> {
        Ok(self.store.update(&self.code, patch)?)
    }

    /// Pick the board size while waiting. Host only; other callers are
    /// ignored.
    pub fn set_board_size(&self, size: BoardSize) -> Result<(), SessionError> {
        if self.role != Party::Host {
            debug!("ignoring set_board_size from guest");
            return Ok(());
        }
        self.update(DocPatch::new().set("board_size", u8::from(size)))
    }

    /// Flag readiness while waiting. Guest only; other callers are
    /// ignored.
    pub fn set_ready(&self, ready: bool) -> Result<(), SessionError> {
        if self.role != Party::Guest {
            debug!("ignoring set_ready from host");
            return Ok(());
        }
        self.update(DocPatch::new().set("guest/ready", ready))
    }

    /// Start a game with the given deck. Host only, and gated on a
    /// seated, ready guest; returns whether the start was written.
    pub fn start_game(
        &self,
        cards: &[Card],
        time_remaining: Option<u32>,
    ) -> Result<bool, SessionError> {
        if self.role != Party::Host {
            debug!("ignoring start_game from guest");
            return Ok(false);
        }

        let doc = self.read_doc()?;
        let guest_ready = doc.guest.as_ref().is_some_and(|g| g.ready);
        let in_lobby =
            matches!(doc.status, SessionStatus::Waiting | SessionStatus::Ready);
        if !in_lobby || !guest_ready {
            debug!("start_game ignored: status {:?}, guest ready {guest_ready}", doc.status);
            return Ok(false);
        }

        self.update(start_patch(cards, time_remaining))?;
        info!("session {} started, {} cards", self.code, cards.len());
        Ok(true)
    }

    /// Leave the session cleanly.
    ///
    /// Cancels the subscription first so no stale snapshot lands after
    /// teardown, then: host deletes the document (ending the session
    /// for the guest), guest clears its seat and resets the session to
    /// `waiting`.
    pub fn leave(mut self) -> Result<(), SessionError> {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }

        match self.role {
            Party::Host => {
                info!("host leaving, deleting session {}", self.code);
                self.store.delete(&self.code)?;
            }
            Party::Guest => {
                info!("guest leaving session {}", self.code);
                self.store.update(
                    &self.code,
                    DocPatch::new()
                        .remove("guest")
                        .set("status", "waiting")
                        .set("presence/guest", false),
                )?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("code", &self.code)
            .field("role", &self.role)
            .finish()
    }
}

/// The field group a return to the waiting room rewrites. The guest
/// stays seated but must flag ready again.
pub(crate) fn lobby_patch() -> DocPatch {
    DocPatch::new()
        .set("status", "waiting")
        .set("cards", json!([]))
        .set("flipped", json!([]))
        .set("scores", json!({ "host": 0, "guest": 0 }))
        .set("guest/ready", false)
        .remove("last_mismatch")
        .remove("winner")
        .remove("time_remaining")
        .set("rematch", json!({ "host": false, "guest": false }))
        .set("return_lobby", json!({ "host": false, "guest": false }))
}

/// The field group a game start (or rematch restart) rewrites.
pub(crate) fn start_patch(cards: &[Card], time_remaining: Option<u32>) -> DocPatch {
    let cards_value = serde_json::to_value(cards).expect("cards serialize");
    let patch = DocPatch::new()
        .set("cards", cards_value)
        .set("status", "playing")
        .set("current_turn", "host")
        .set("flipped", json!([]))
        .set("scores", json!({ "host": 0, "guest": 0 }))
        .remove("last_mismatch")
        .remove("winner")
        .set("rematch", json!({ "host": false, "guest": false }))
        .set("return_lobby", json!({ "host": false, "guest": false }));
    match time_remaining {
        Some(seconds) => patch.set("time_remaining", seconds),
        None => patch.remove("time_remaining"),
    }
}

/// Subscribe to a document, decoding snapshots into a signal channel.
fn subscribe_signals(
    store: &dyn SessionStore,
    code: &str,
) -> Result<(Subscription, mpsc::Receiver<SessionSignal>), StoreError> {
    let (tx, rx) = mpsc::channel();
    let subscription = store.subscribe(
        code,
        Box::new(move |value| {
            let signal = match value {
                Some(value) => match SessionDoc::decode(value) {
                    Ok(doc) => SessionSignal::Snapshot(doc),
                    Err(e) => SessionSignal::Corrupt(e.to_string()),
                },
                None => SessionSignal::Closed,
            };
            let _ = tx.send(signal);
        }),
    )?;
    Ok((subscription, rx))
}
