//! Syntactic command validation, the first pipeline stage.

use thiserror::Error;

use crate::command::Command;

/// A command that failed syntactic validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Syntactic gate run before any state is touched.
///
/// Distinct from preconditions: validators check the shape of the command,
/// preconditions check whether it is legal against the current room state.
pub trait CommandValidator: Send + Sync {
    /// Checks the command's shape, rejecting before handler resolution.
    fn validate(&self, command: &Command) -> Result<(), ValidationError>;
}

/// Default structural validator.
///
/// Checks that the command name is a non-empty alphanumeric identifier, that
/// the payload is a JSON object, and that the room id, when present, is not
/// empty. Richer schema catalogues can replace this via
/// [`CommandProcessor::with_validator`](crate::CommandProcessor::with_validator).
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl CommandValidator for SchemaValidator {
    fn validate(&self, command: &Command) -> Result<(), ValidationError> {
        if command.name.is_empty() {
            return Err(ValidationError::new("command name must not be empty"));
        }
        if !command.name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::new(format!(
                "command name '{}' must be alphanumeric",
                command.name
            )));
        }
        if !command.payload.is_object() {
            return Err(ValidationError::new("command payload must be an object"));
        }
        if let Some(room_id) = &command.room_id
            && room_id.is_empty()
        {
            return Err(ValidationError::new("roomId must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_command() {
        let command = Command::new("joinRoom", "roomA", json!({"username": "t"}));
        assert!(SchemaValidator.validate(&command).is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let command = Command::new("", "roomA", json!({}));
        assert!(SchemaValidator.validate(&command).is_err());
    }

    #[test]
    fn rejects_non_alphanumeric_name() {
        let command = Command::new("join room!", "roomA", json!({}));
        assert!(SchemaValidator.validate(&command).is_err());
    }

    #[test]
    fn rejects_non_object_payload() {
        let command = Command::new("joinRoom", "roomA", json!("not an object"));
        assert!(SchemaValidator.validate(&command).is_err());
    }

    #[test]
    fn rejects_empty_room_id() {
        let command = Command::new("joinRoom", "", json!({}));
        assert!(SchemaValidator.validate(&command).is_err());
    }

    #[test]
    fn accepts_absent_room_id() {
        let command = Command::without_room("joinRoom", json!({}));
        assert!(SchemaValidator.validate(&command).is_ok());
    }
}
