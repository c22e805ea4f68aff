//! The command processor: one deterministic pipeline per command.

use std::sync::Arc;

use chrono::Utc;

use common::{Room, UserId};
use room_store::RoomStore;

use crate::command::Command;
use crate::error::ProcessorError;
use crate::event::Event;
use crate::queue::SequenceQueue;
use crate::registry::{EventSink, HandlerRegistry};
use crate::validate::{CommandValidator, SchemaValidator};

/// Runs the seven-stage pipeline for each submitted command.
///
/// Every call to [`process`](Self::process) enqueues exactly one job on the
/// shared [`SequenceQueue`], so pipeline runs never interleave: a command
/// submitted after another observes the room state left behind by the full
/// completion of the earlier one, for every room in the process.
///
/// Cloning shares the queue, store, and registry.
pub struct CommandProcessor<S: RoomStore> {
    inner: Arc<Pipeline<S>>,
    queue: SequenceQueue,
}

impl<S: RoomStore> Clone for CommandProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            queue: self.queue.clone(),
        }
    }
}

struct Pipeline<S> {
    store: S,
    registry: HandlerRegistry,
    validator: Box<dyn CommandValidator>,
}

impl<S: RoomStore + 'static> CommandProcessor<S> {
    /// Creates a processor with the default [`SchemaValidator`].
    pub fn new(store: S, registry: HandlerRegistry) -> Self {
        Self::with_validator(store, registry, SchemaValidator)
    }

    /// Creates a processor with a custom command validator.
    pub fn with_validator(
        store: S,
        registry: HandlerRegistry,
        validator: impl CommandValidator + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Pipeline {
                store,
                registry,
                validator: Box::new(validator),
            }),
            queue: SequenceQueue::new(),
        }
    }

    /// Returns the handler registry, e.g. for replaying events on replicas.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Returns the underlying room store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Processes one command on behalf of `user_id`.
    ///
    /// Resolves with the ordered list of produced events once the command's
    /// pipeline run has fully completed (including persistence), or rejects
    /// with the error of the stage that failed. On rejection no aggregate
    /// state has been persisted.
    #[tracing::instrument(
        skip(self, command),
        fields(command_name = %command.name, command_id = %command.id)
    )]
    pub async fn process(
        &self,
        command: Command,
        user_id: UserId,
    ) -> Result<Vec<Event>, ProcessorError> {
        let pipeline = Arc::clone(&self.inner);
        let outcome = self
            .queue
            .run(move || async move { pipeline.run(command, user_id).await })
            .await
            .map_err(|_| ProcessorError::QueueClosed)?;

        match &outcome {
            Ok(events) => {
                metrics::counter!("commands_processed").increment(1);
                tracing::debug!(events = events.len(), "command processed");
            }
            Err(error) => {
                metrics::counter!("commands_failed").increment(1);
                tracing::warn!(%error, "command rejected");
            }
        }

        outcome
    }
}

impl<S: RoomStore> Pipeline<S> {
    async fn run(
        &self,
        command: Command,
        user_id: UserId,
    ) -> Result<Vec<Event>, ProcessorError> {
        // 1. Validate: syntactic gate, before any state is touched.
        self.validator.validate(&command)?;

        // 2. Resolve handler.
        let handler = self.registry.command_handler(&command.name).ok_or_else(|| {
            ProcessorError::HandlerNotFound {
                command_name: command.name.clone(),
            }
        })?;

        // 3. Load aggregate, or synthesize a fresh one when permitted.
        let existing = match &command.room_id {
            Some(room_id) => self.store.load(room_id).await?,
            None => None,
        };
        let room = match existing {
            Some(room) => room,
            None if handler.requires_existing_room() => {
                return Err(ProcessorError::MissingRoom {
                    command_name: command.name.clone(),
                    room_id: command
                        .room_id
                        .as_ref()
                        .map_or_else(|| "(none)".to_string(), ToString::to_string),
                });
            }
            None => command.room_id.as_ref().map_or_else(Room::new, Room::with_id),
        };

        // 4. Preconditions: semantic checks, still no mutation.
        handler
            .precondition(&room, &command, &user_id)
            .map_err(|violation| ProcessorError::Precondition {
                command_name: command.name.clone(),
                reason: violation.to_string(),
            })?;

        // 5. Execute: the handler declares events through the sink.
        let mut sink = EventSink::new(&self.registry, &user_id);
        handler.execute(&room, &command, &mut sink)?;
        let pending = sink.into_pending();

        // 6. Apply in declaration order, threading the room so later reducers
        // observe the effects of earlier ones. Each event record is built
        // after its reducer ran: the room id it carries is the post-apply
        // identity, which is what makes creation commands work at all.
        let mut room = room;
        let mut events = Vec::with_capacity(pending.len());
        for (name, payload) in pending {
            let reducer =
                self.registry
                    .reducer(&name)
                    .ok_or_else(|| ProcessorError::UnknownEvent {
                        event_name: name.clone(),
                    })?;
            room = reducer(room, &payload);
            events.push(Event::new(
                name,
                user_id.clone(),
                command.id,
                room.id(),
                payload,
            ));
        }

        // 7. Persist: stamp activity and save. Runs for every successful
        // command, event-producing or not.
        let room = room.touch(Utc::now().timestamp_millis());
        self.store.save(room).await?;

        Ok(events)
    }
}
