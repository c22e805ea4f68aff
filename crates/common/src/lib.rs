pub mod room;
pub mod types;

pub use room::Room;
pub use types::{CommandId, EventId, RoomId, UserId};
