use async_trait::async_trait;

use common::{Room, RoomId};

use crate::Result;

/// Core trait for room store implementations.
///
/// A room store persists the latest snapshot of each room. `save` replaces
/// whatever snapshot was stored before; there is no history and no version
/// check, because the pipeline's sequence queue guarantees that no two
/// load/save cycles for the same process ever interleave.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Loads the current snapshot of a room.
    ///
    /// Returns `None` if no room with this id has ever been saved.
    async fn load(&self, id: &RoomId) -> Result<Option<Room>>;

    /// Saves a room snapshot, replacing any previous one.
    ///
    /// Fails with [`StoreError::MissingRoomId`](crate::StoreError::MissingRoomId)
    /// if the room has no established identity.
    async fn save(&self, room: Room) -> Result<()>;
}
