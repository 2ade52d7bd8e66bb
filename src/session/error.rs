//! Session lifecycle failure taxonomy.

use thiserror::Error;

use crate::store::StoreError;

/// Why a lifecycle operation failed.
///
/// All of these are scoped to the current session; none are fatal to
/// the process. `NotFound`, `Full`, and `AlreadyStarted` surface
/// synchronously from `join` for user-visible messaging.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The join code has no session behind it.
    #[error("no session found for that code")]
    NotFound,

    /// The guest slot is already occupied.
    #[error("session is full")]
    Full,

    /// Play already began; the session no longer accepts a guest.
    #[error("game already started")]
    AlreadyStarted,

    /// The document disappeared while a non-host party was mid-session.
    #[error("session closed by host")]
    Closed,

    /// The document store could not serve the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}
