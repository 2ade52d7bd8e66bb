//! The shared session document store.
//!
//! Both parties of a session read and write one replicated document;
//! this module defines its schema, the partial-update patch format, the
//! store trait the game core programs against, and an in-process
//! reference implementation used by tests and local play.

pub mod document;
pub mod memory;
pub mod patch;
pub mod store;

pub use document::{MismatchRecord, PartySeat, SessionDoc, SessionStatus};
pub use memory::{MemoryClient, MemoryStore};
pub use patch::DocPatch;
pub use store::{
    DisconnectAction, SessionStore, SnapshotCallback, StoreError, Subscription,
};
