//! Session lifecycle: room codes, create/join/leave, presence.
//!
//! A session is one shared document between at most two parties. The
//! host creates it under a collision-checked 5-digit code and owns its
//! deletion; the guest claims the second seat. Disconnects are handled
//! by actions armed at the store, not by polling.

pub mod code;
pub mod error;
pub mod manager;

pub use code::generate_code;
pub use error::SessionError;
pub use manager::{Session, SessionSignal};
