//! Deterministic command processing pipeline over room aggregates.
//!
//! Every command runs through the same seven stages: validate, resolve
//! handler, load aggregate, check preconditions, execute business logic
//! (producing events), apply events through pure reducers, persist. A global
//! sequence queue serializes pipeline runs so that no two commands ever
//! read-modify-write the same room from a stale snapshot.
//!
//! Business logic is pluggable: command handlers and event reducers are
//! registered by name in a [`HandlerRegistry`]. The registry's
//! [`apply`](HandlerRegistry::apply) entry point is also usable on its own,
//! so remote observers holding the same reducer set can replay received
//! events against a local replica.

pub mod command;
pub mod error;
pub mod event;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod validate;

pub use command::Command;
pub use error::ProcessorError;
pub use event::Event;
pub use processor::CommandProcessor;
pub use queue::{QueueClosed, SequenceQueue};
pub use registry::{CommandHandler, EventSink, HandlerRegistry, PreconditionViolation, Reducer};
pub use validate::{CommandValidator, SchemaValidator, ValidationError};
