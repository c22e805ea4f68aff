use thiserror::Error;

/// Errors that can occur when interacting with the room store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A room without an established identity cannot be saved.
    #[error("Cannot save a room without an established roomId")]
    MissingRoomId,

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific error occurred.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for room store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
