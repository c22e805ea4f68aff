use common::{CommandId, EventId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable fact recording one state change.
///
/// Events are produced exclusively by command handlers during a pipeline run
/// and consumed by reducers (locally during the same run, and by any remote
/// observer replicating the state change). They are not persisted; the store
/// keeps room snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Freshly generated unique identifier.
    pub id: EventId,

    /// Selects the reducer in the registry.
    pub name: String,

    /// The user whose command triggered this event.
    pub user_id: UserId,

    /// The id of the originating command, for causal traceability.
    pub correlation_id: CommandId,

    /// The room this event belongs to, read from the aggregate *after* the
    /// event's reducer ran. Creation events establish the identity that the
    /// events of the same command then carry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    /// Reducer-specific payload.
    pub payload: Value,
}

impl Event {
    /// Creates an event record with a fresh id.
    pub fn new(
        name: impl Into<String>,
        user_id: UserId,
        correlation_id: CommandId,
        room_id: Option<RoomId>,
        payload: Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            name: name.into(),
            user_id,
            correlation_id,
            room_id,
            payload,
        }
    }
}
