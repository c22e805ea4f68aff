use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{Room, RoomId};

use crate::{Result, StoreError, store::RoomStore};

/// In-memory room store implementation.
///
/// The default store for tests and single-process deployments. Cloning is
/// cheap and all clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryRoomStore {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryRoomStore {
    /// Creates a new empty in-memory room store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rooms currently stored.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns how many times `save` has been called successfully.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Clears all rooms.
    pub async fn clear(&self) {
        self.rooms.write().await.clear();
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn load(&self, id: &RoomId) -> Result<Option<Room>> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(id).cloned())
    }

    async fn save(&self, room: Room) -> Result<()> {
        let id = room.id().ok_or(StoreError::MissingRoomId)?;
        let mut rooms = self.rooms.write().await;
        rooms.insert(id, room);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
