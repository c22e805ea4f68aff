//! Pipeline error taxonomy.

use room_store::StoreError;
use thiserror::Error;

use crate::validate::ValidationError;

/// Errors that reject a command. Each maps to exactly one pipeline stage;
/// none of them leaves partially persisted aggregate state behind.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The command failed schema validation. No state was touched.
    #[error("Command validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No command handler is registered under this name. No state was touched.
    #[error("No command handler registered for '{command_name}'")]
    HandlerNotFound { command_name: String },

    /// The handler requires an existing room, but none was found in the store.
    #[error("Room {room_id} not found for command '{command_name}'")]
    MissingRoom {
        command_name: String,
        room_id: String,
    },

    /// A semantic precondition failed. Carries the command name for context.
    #[error("Precondition failed for command '{command_name}': {reason}")]
    Precondition {
        command_name: String,
        reason: String,
    },

    /// A handler declared an event name with no matching reducer. Fatal to
    /// the command; nothing is persisted.
    #[error("No event handler registered for '{event_name}'")]
    UnknownEvent { event_name: String },

    /// The room store failed to load or save.
    #[error("Room store error: {0}")]
    Storage(#[from] StoreError),

    /// The sequence queue worker is gone (process shutting down).
    #[error("Sequence queue is shut down")]
    QueueClosed,
}
