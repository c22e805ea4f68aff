//! Aggregate snapshot persistence for the room command pipeline.
//!
//! The store persists whole room snapshots, not event logs: the pipeline
//! loads a room, runs one command against it, and saves the result. Access
//! is serialized by the pipeline's sequence queue, so implementations need
//! not assume concurrent callers.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryRoomStore;
pub use store::RoomStore;
