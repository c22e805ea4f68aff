//! Command handlers holding the planning-poker business rules.
//!
//! Handlers never touch room state themselves; they check preconditions and
//! declare events, leaving every mutation to the reducers so that remote
//! replicas end up in the same state from the events alone.

use serde_json::{Value, json};
use uuid::Uuid;

use common::{Room, RoomId, UserId};
use processor::{Command, CommandHandler, EventSink, PreconditionViolation, ProcessorError};

fn payload_str<'a>(command: &'a Command, field: &str) -> Option<&'a str> {
    command.payload.get(field)?.as_str()
}

fn require_user_in_room(room: &Room, user_id: &UserId) -> Result<(), PreconditionViolation> {
    let present = room
        .nested("users")
        .is_some_and(|users| users.contains_key(user_id.as_str()));
    if present {
        Ok(())
    } else {
        Err(PreconditionViolation::new(format!(
            "user {user_id} is not part of the room"
        )))
    }
}

fn require_story<'a>(
    room: &Room,
    command: &'a Command,
) -> Result<&'a str, PreconditionViolation> {
    let story_id = payload_str(command, "storyId")
        .ok_or_else(|| PreconditionViolation::new("payload must name a storyId"))?;
    let exists = room
        .nested("stories")
        .is_some_and(|stories| stories.contains_key(story_id));
    if exists {
        Ok(story_id)
    } else {
        Err(PreconditionViolation::new(format!(
            "story {story_id} does not exist"
        )))
    }
}

fn require_selected_story<'a>(
    room: &Room,
    command: &'a Command,
) -> Result<&'a str, PreconditionViolation> {
    let story_id = require_story(room, command)?;
    let selected = room.get("selectedStory").and_then(Value::as_str);
    if selected == Some(story_id) {
        Ok(story_id)
    } else {
        Err(PreconditionViolation::new(format!(
            "story {story_id} is not the selected story"
        )))
    }
}

/// Joins a room, creating it on first join.
///
/// The only handler that tolerates a missing room: the pipeline hands it a
/// fresh aggregate and the emitted `roomCreated` event establishes the
/// identity, generated here when the command brought none.
pub struct JoinRoom;

impl CommandHandler for JoinRoom {
    fn requires_existing_room(&self) -> bool {
        false
    }

    fn execute(
        &self,
        room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        if room.nested("users").is_none() {
            let payload = match room.id() {
                Some(_) => json!({}),
                None => json!({"id": RoomId::new()}),
            };
            events.emit("roomCreated", payload)?;
        }

        let user_id = events.user_id().clone();
        let mut users = room.nested("users").cloned().unwrap_or_default();
        users.entry(user_id.as_str()).or_insert(json!({}));
        events.emit("joinedRoom", json!({"userId": user_id, "users": users}))?;

        if let Some(username) = payload_str(command, "username")
            && !username.trim().is_empty()
        {
            events.emit("usernameSet", json!({"userId": user_id, "username": username}))?;
        }
        Ok(())
    }
}

/// Leaves the room.
pub struct LeaveRoom;

impl CommandHandler for LeaveRoom {
    fn precondition(
        &self,
        room: &Room,
        _command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)
    }

    fn execute(
        &self,
        _room: &Room,
        _command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let user_id = events.user_id().clone();
        events.emit("leftRoom", json!({"userId": user_id}))
    }
}

/// Sets the acting user's display name.
pub struct SetUsername;

impl CommandHandler for SetUsername {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        match payload_str(command, "username") {
            Some(username) if !username.trim().is_empty() => Ok(()),
            _ => Err(PreconditionViolation::new(
                "username must be a non-empty string",
            )),
        }
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let user_id = events.user_id().clone();
        let username = payload_str(command, "username").unwrap_or_default();
        events.emit("usernameSet", json!({"userId": user_id, "username": username}))
    }
}

/// Adds a story to the backlog.
pub struct AddStory;

impl CommandHandler for AddStory {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        match payload_str(command, "title") {
            Some(title) if !title.trim().is_empty() => Ok(()),
            _ => Err(PreconditionViolation::new("story title must not be empty")),
        }
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        events.emit(
            "storyAdded",
            json!({
                "id": Uuid::new_v4().to_string(),
                "title": payload_str(command, "title").unwrap_or_default(),
                "description": payload_str(command, "description").unwrap_or_default(),
                "estimations": {}
            }),
        )
    }
}

/// Selects the story to estimate next.
pub struct SelectStory;

impl CommandHandler for SelectStory {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        require_story(room, command).map(|_| ())
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let story_id = payload_str(command, "storyId").unwrap_or_default();
        events.emit("storySelected", json!({"storyId": story_id}))
    }
}

/// Gives an estimate for the currently selected story.
pub struct GiveStoryEstimate;

impl CommandHandler for GiveStoryEstimate {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        require_selected_story(room, command)?;
        if command.payload.get("value").and_then(Value::as_i64).is_some() {
            Ok(())
        } else {
            Err(PreconditionViolation::new("estimate value must be a number"))
        }
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let user_id = events.user_id().clone();
        events.emit(
            "storyEstimateGiven",
            json!({
                "storyId": payload_str(command, "storyId").unwrap_or_default(),
                "userId": user_id,
                "value": command.payload.get("value").cloned().unwrap_or(Value::Null)
            }),
        )
    }
}

/// Retracts the acting user's estimate for the selected story.
pub struct ClearStoryEstimate;

impl CommandHandler for ClearStoryEstimate {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        require_selected_story(room, command).map(|_| ())
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let user_id = events.user_id().clone();
        events.emit(
            "storyEstimateCleared",
            json!({
                "storyId": payload_str(command, "storyId").unwrap_or_default(),
                "userId": user_id
            }),
        )
    }
}

/// Starts a new estimation round for a story, wiping previous estimates.
pub struct NewEstimationRound;

impl CommandHandler for NewEstimationRound {
    fn precondition(
        &self,
        room: &Room,
        command: &Command,
        user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        require_user_in_room(room, user_id)?;
        require_story(room, command).map(|_| ())
    }

    fn execute(
        &self,
        _room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError> {
        let story_id = payload_str(command, "storyId").unwrap_or_default();
        events.emit("newEstimationRoundStarted", json!({"storyId": story_id}))
    }
}
