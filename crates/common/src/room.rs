//! The room aggregate value type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RoomId;

/// Field under which a room stores its identity.
pub const ID_FIELD: &str = "roomId";

/// Field stamped with the time of the last successful command, in epoch millis.
pub const LAST_ACTIVITY_FIELD: &str = "lastActivity";

/// A versionless snapshot of one room's state.
///
/// A room is a plain mapping of field names to JSON values. The pipeline only
/// interprets the `roomId` and `lastActivity` fields; everything else is
/// handler-defined (nested maps such as `users` and `stories`).
///
/// All mutation helpers consume `self` and return the updated room, so a
/// loaded snapshot held elsewhere (e.g. by the store, or by an observer that
/// received the previous state) is never modified in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Room {
    fields: Map<String, Value>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty room seeded with the given identity.
    pub fn with_id(id: &RoomId) -> Self {
        Self::new().set(ID_FIELD, Value::String(id.as_str().to_string()))
    }

    /// Creates a room from a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Creates a room directly from a field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Consumes the room, returning its field map.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Returns the room as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Returns the room's identity, if one has been established.
    pub fn id(&self) -> Option<RoomId> {
        self.fields.get(ID_FIELD)?.as_str().map(RoomId::from)
    }

    /// Returns a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field interpreted as a nested map (e.g. `users`, `stories`).
    pub fn nested(&self, field: &str) -> Option<&Map<String, Value>> {
        self.fields.get(field)?.as_object()
    }

    /// Returns true if the room has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the `lastActivity` stamp in epoch millis, if set.
    pub fn last_activity(&self) -> Option<i64> {
        self.fields.get(LAST_ACTIVITY_FIELD)?.as_i64()
    }

    /// Sets a top-level field, replacing any previous value.
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Merges `value` into the entry `key` of the nested map `map_field`.
    ///
    /// The nested map is created if absent. When both the existing entry and
    /// the incoming value are objects, the incoming fields are merged into the
    /// existing entry one by one, so fields the incoming value does not name
    /// are preserved. Sibling entries are never touched.
    pub fn merge_entry(mut self, map_field: &str, key: &str, value: Value) -> Self {
        let outer = self
            .fields
            .entry(map_field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(entries) = outer.as_object_mut() {
            let merged = match (entries.remove(key), value) {
                (Some(Value::Object(mut existing)), Value::Object(incoming)) => {
                    existing.extend(incoming);
                    Value::Object(existing)
                }
                (_, incoming) => incoming,
            };
            entries.insert(key.to_string(), merged);
        }
        self
    }

    /// Removes exactly the entry `key` from the nested map `map_field`.
    ///
    /// Everything else is left untouched; a missing map or key is a no-op.
    pub fn remove_entry(mut self, map_field: &str, key: &str) -> Self {
        if let Some(Value::Object(entries)) = self.fields.get_mut(map_field) {
            entries.remove(key);
        }
        self
    }

    /// Stamps `lastActivity`, keeping it monotonically non-decreasing even if
    /// the wall clock steps backward.
    pub fn touch(self, now_millis: i64) -> Self {
        let stamped = self
            .last_activity()
            .map_or(now_millis, |previous| previous.max(now_millis));
        self.set(LAST_ACTIVITY_FIELD, Value::from(stamped))
    }
}
