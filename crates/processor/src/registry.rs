//! Pluggable command handlers, event reducers, and their registry.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use common::{Room, UserId};

use crate::command::Command;
use crate::error::ProcessorError;
use crate::event::Event;

/// A pure reducer mapping (prior room, event payload) to the next room.
///
/// Reducers must be referentially transparent: the same inputs always yield
/// the same result, with no side effects, because remote observers re-execute
/// the identical reducer to replicate the state change. Unspecified payload
/// fields are treated as no-ops.
pub type Reducer = Box<dyn Fn(Room, &Value) -> Room + Send + Sync>;

/// A semantic precondition that did not hold.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PreconditionViolation(String);

impl PreconditionViolation {
    /// Creates a violation with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Business logic for one command name.
///
/// Handlers never mutate the room directly; they declare events through the
/// [`EventSink`] and leave all state changes to the registered reducers.
pub trait CommandHandler: Send + Sync {
    /// Whether the target room must already exist in the store.
    ///
    /// When false, the pipeline synthesizes a fresh empty room if the store
    /// has none, so `execute` always receives a valid room value.
    fn requires_existing_room(&self) -> bool {
        true
    }

    /// Semantic legality check, run before any state change.
    fn precondition(
        &self,
        _room: &Room,
        _command: &Command,
        _user_id: &UserId,
    ) -> Result<(), PreconditionViolation> {
        Ok(())
    }

    /// Declares zero or more events via the sink.
    fn execute(
        &self,
        room: &Room,
        command: &Command,
        events: &mut EventSink<'_>,
    ) -> Result<(), ProcessorError>;
}

/// Collector through which handlers declare events.
///
/// Emitting a name with no registered reducer fails right away, so a typo in
/// a handler is caught before anything is applied or persisted. The sink also
/// carries the acting user so handlers can reference the actor in payloads.
pub struct EventSink<'a> {
    registry: &'a HandlerRegistry,
    user_id: &'a UserId,
    pending: Vec<(String, Value)>,
}

impl<'a> EventSink<'a> {
    /// Creates a sink bound to a registry and an acting user.
    pub fn new(registry: &'a HandlerRegistry, user_id: &'a UserId) -> Self {
        Self {
            registry,
            user_id,
            pending: Vec::new(),
        }
    }

    /// Returns the acting user.
    pub fn user_id(&self) -> &UserId {
        self.user_id
    }

    /// Declares an event to be applied after `execute` returns.
    ///
    /// Events are applied in declaration order; later reducers of the same
    /// command observe the effects of earlier ones.
    pub fn emit(&mut self, name: impl Into<String>, payload: Value) -> Result<(), ProcessorError> {
        let name = name.into();
        if !self.registry.has_reducer(&name) {
            return Err(ProcessorError::UnknownEvent { event_name: name });
        }
        self.pending.push((name, payload));
        Ok(())
    }

    /// Consumes the sink, returning the declared (name, payload) pairs.
    pub(crate) fn into_pending(self) -> Vec<(String, Value)> {
        self.pending
    }
}

/// Open catalogue of command handlers and event reducers, looked up by name.
///
/// Absence of a requested key is always an error, never a default: a silently
/// dropped event would desynchronize every replica applying the same stream.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<String, Box<dyn CommandHandler>>,
    reducers: HashMap<String, Reducer>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command handler under a name, replacing any previous one.
    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) {
        self.commands.insert(name.into(), Box::new(handler));
    }

    /// Registers an event reducer under a name, replacing any previous one.
    pub fn register_reducer(
        &mut self,
        name: impl Into<String>,
        reducer: impl Fn(Room, &Value) -> Room + Send + Sync + 'static,
    ) {
        self.reducers.insert(name.into(), Box::new(reducer));
    }

    /// Looks up a command handler by name.
    pub fn command_handler(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.commands.get(name).map(|handler| handler.as_ref())
    }

    /// Looks up a reducer by name.
    pub fn reducer(&self, name: &str) -> Option<&Reducer> {
        self.reducers.get(name)
    }

    /// Returns true if a reducer is registered under this name.
    pub fn has_reducer(&self, name: &str) -> bool {
        self.reducers.contains_key(name)
    }

    /// Applies one event to a room, dispatching on the event name.
    ///
    /// This is the same application step the pipeline runs in stage six,
    /// exposed so observers outside the authoritative process can reconstruct
    /// state from a received event stream.
    pub fn apply(&self, room: Room, event: &Event) -> Result<Room, ProcessorError> {
        let reducer = self
            .reducer(&event.name)
            .ok_or_else(|| ProcessorError::UnknownEvent {
                event_name: event.name.clone(),
            })?;
        Ok(reducer(room, &event.payload))
    }

    /// Applies an ordered event sequence, threading the room through.
    pub fn apply_all(&self, room: Room, events: &[Event]) -> Result<Room, ProcessorError> {
        events.iter().try_fold(room, |room, event| self.apply(room, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CommandId;
    use serde_json::json;

    fn registry_with_counter() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register_reducer("counted", |room: Room, _payload: &Value| {
            let count = room.get("count").and_then(Value::as_i64).unwrap_or(0);
            room.set("count", json!(count + 1))
        });
        registry
    }

    fn event(name: &str) -> Event {
        Event::new(name, UserId::from("u1"), CommandId::new(), None, json!({}))
    }

    #[test]
    fn apply_dispatches_on_event_name() {
        let registry = registry_with_counter();
        let room = registry.apply(Room::new(), &event("counted")).unwrap();
        assert_eq!(room.get("count"), Some(&json!(1)));
    }

    #[test]
    fn apply_fails_on_unknown_event_name() {
        let registry = registry_with_counter();
        let result = registry.apply(Room::new(), &event("nope"));
        assert!(matches!(
            result,
            Err(ProcessorError::UnknownEvent { event_name }) if event_name == "nope"
        ));
    }

    #[test]
    fn apply_all_threads_the_room_through() {
        let registry = registry_with_counter();
        let events = vec![event("counted"), event("counted"), event("counted")];
        let room = registry.apply_all(Room::new(), &events).unwrap();
        assert_eq!(room.get("count"), Some(&json!(3)));
    }

    #[test]
    fn replaying_the_same_events_yields_the_same_state() {
        let registry = registry_with_counter();
        let events = vec![event("counted"), event("counted")];

        let replica_a = registry.apply_all(Room::new(), &events).unwrap();
        let replica_b = registry.apply_all(Room::new(), &events).unwrap();

        assert_eq!(replica_a, replica_b);
    }

    #[test]
    fn sink_rejects_unknown_event_at_declaration_time() {
        let registry = registry_with_counter();
        let user_id = UserId::from("u1");
        let mut sink = EventSink::new(&registry, &user_id);

        assert!(sink.emit("counted", json!({})).is_ok());
        assert!(matches!(
            sink.emit("typoed", json!({})),
            Err(ProcessorError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn sink_preserves_declaration_order() {
        let mut registry = registry_with_counter();
        registry.register_reducer("other", |room: Room, _: &Value| room);
        let user_id = UserId::from("u1");
        let mut sink = EventSink::new(&registry, &user_id);

        sink.emit("counted", json!({"n": 1})).unwrap();
        sink.emit("other", json!({})).unwrap();
        sink.emit("counted", json!({"n": 2})).unwrap();

        let names: Vec<_> = sink
            .into_pending()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["counted", "other", "counted"]);
    }
}
