use common::{CommandId, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A requested intent submitted by an actor.
///
/// Commands are immutable after construction and opaque to the pipeline
/// beyond `name` (handler selection) and `room_id` (aggregate targeting).
/// The acting user is supplied out-of-band, not as part of the command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Unique identifier, echoed on produced events as the correlation id.
    pub id: CommandId,

    /// Selects the command handler in the registry.
    pub name: String,

    /// The room this command targets. Absent for creation commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    /// Handler-specific payload, opaque to the pipeline.
    #[serde(default)]
    pub payload: Value,
}

impl Command {
    /// Creates a command targeting an existing room.
    pub fn new(name: impl Into<String>, room_id: impl Into<RoomId>, payload: Value) -> Self {
        Self {
            id: CommandId::new(),
            name: name.into(),
            room_id: Some(room_id.into()),
            payload,
        }
    }

    /// Creates a command without a target room (e.g. room creation).
    pub fn without_room(name: impl Into<String>, payload: Value) -> Self {
        Self {
            id: CommandId::new(),
            name: name.into(),
            room_id: None,
            payload,
        }
    }
}
