//! Pure event reducers for planning-poker rooms.
//!
//! Every reducer follows the same merge/delete-exact discipline: new entries
//! are merged into their nested map without disturbing sibling entries, and
//! removals delete exactly the identified key. Missing payload fields are
//! no-ops, never errors, because the same reducer runs unmodified on remote
//! replicas fed only the event.

use serde_json::{Value, json};

use common::{Room, room::ID_FIELD};

/// A room came into existence. Establishes the identity when the payload
/// carries one (creation without a client-chosen id) and initializes the
/// nested maps.
pub fn room_created(room: Room, payload: &Value) -> Room {
    let mut room = room;
    if let Some(id) = payload.get("id").and_then(Value::as_str) {
        room = room.set(ID_FIELD, json!(id));
    }
    if room.get("users").is_none() {
        room = room.set("users", json!({}));
    }
    if room.get("stories").is_none() {
        room = room.set("stories", json!({}));
    }
    room
}

/// A user joined. Merges the payload's user entries into the room, field by
/// field, so data already known about present users is preserved.
pub fn joined_room(room: Room, payload: &Value) -> Room {
    let Some(users) = payload.get("users").and_then(Value::as_object) else {
        return room;
    };
    users.iter().fold(room, |room, (user_id, data)| {
        room.merge_entry("users", user_id, data.clone())
    })
}

/// A user left. Deletes exactly that user's entry.
pub fn left_room(room: Room, payload: &Value) -> Room {
    match payload.get("userId").and_then(Value::as_str) {
        Some(user_id) => room.remove_entry("users", user_id),
        None => room,
    }
}

/// A user chose a display name.
pub fn username_set(room: Room, payload: &Value) -> Room {
    let (Some(user_id), Some(username)) = (
        payload.get("userId").and_then(Value::as_str),
        payload.get("username").and_then(Value::as_str),
    ) else {
        return room;
    };
    room.merge_entry("users", user_id, json!({"username": username}))
}

/// A story was added. The payload is the full story object, stored under its id.
pub fn story_added(room: Room, payload: &Value) -> Room {
    match payload.get("id").and_then(Value::as_str) {
        Some(story_id) => room.merge_entry("stories", story_id, payload.clone()),
        None => room,
    }
}

/// A story was selected for estimation.
pub fn story_selected(room: Room, payload: &Value) -> Room {
    match payload.get("storyId").and_then(Value::as_str) {
        Some(story_id) => room.set("selectedStory", json!(story_id)),
        None => room,
    }
}

/// A user estimated the story. Recorded under `stories.<id>.estimations.<user>`.
pub fn story_estimate_given(room: Room, payload: &Value) -> Room {
    let (Some(story_id), Some(user_id), Some(value)) = (
        payload.get("storyId").and_then(Value::as_str),
        payload.get("userId").and_then(Value::as_str),
        payload.get("value"),
    ) else {
        return room;
    };
    with_story(room, story_id, |story| {
        let estimations = story
            .entry("estimations")
            .or_insert_with(|| json!({}));
        if let Some(estimations) = estimations.as_object_mut() {
            estimations.insert(user_id.to_string(), value.clone());
        }
    })
}

/// A user retracted their estimate for the story.
pub fn story_estimate_cleared(room: Room, payload: &Value) -> Room {
    let (Some(story_id), Some(user_id)) = (
        payload.get("storyId").and_then(Value::as_str),
        payload.get("userId").and_then(Value::as_str),
    ) else {
        return room;
    };
    with_story(room, story_id, |story| {
        if let Some(estimations) = story.get_mut("estimations").and_then(Value::as_object_mut) {
            estimations.remove(user_id);
        }
    })
}

/// A new estimation round started: all estimates for the story are wiped.
pub fn new_estimation_round_started(room: Room, payload: &Value) -> Room {
    match payload.get("storyId").and_then(Value::as_str) {
        Some(story_id) => with_story(room, story_id, |story| {
            story.insert("estimations".to_string(), json!({}));
        }),
        None => room,
    }
}

/// Runs `mutate` on one story's object, leaving the room untouched when the
/// story does not exist.
fn with_story(
    room: Room,
    story_id: &str,
    mutate: impl FnOnce(&mut serde_json::Map<String, Value>),
) -> Room {
    let mut fields = room.into_fields();
    if let Some(story) = fields
        .get_mut("stories")
        .and_then(Value::as_object_mut)
        .and_then(|stories| stories.get_mut(story_id))
        .and_then(Value::as_object_mut)
    {
        mutate(story);
    }
    Room::from_fields(fields)
}
