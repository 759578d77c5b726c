//! Session lifecycle: in-process cache over a durable store
//!
//! Reads are cache-aside (durable load only on a miss, degrading to
//! cache-only when the store is down). Writes update the cache
//! synchronously and persist asynchronously; a failed durable save is
//! logged and counted, never surfaced to the turn that triggered it.

pub mod durable;
pub mod store;

pub use durable::{FileDurableStore, InMemoryDurableStore};
pub use store::SessionStore;
