//! Built-in planning-poker catalogue for the room command pipeline.
//!
//! Users join rooms, add and select stories, and give estimates. Command
//! handlers hold the business rules; reducers hold the state transitions.
//! Both are registered by name, so a deployment can extend or replace any
//! of them without touching the pipeline.

pub mod handlers;
pub mod reducers;

use processor::HandlerRegistry;

/// Builds the registry wiring up every built-in command and event.
pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register_command("joinRoom", handlers::JoinRoom);
    registry.register_command("leaveRoom", handlers::LeaveRoom);
    registry.register_command("setUsername", handlers::SetUsername);
    registry.register_command("addStory", handlers::AddStory);
    registry.register_command("selectStory", handlers::SelectStory);
    registry.register_command("giveStoryEstimate", handlers::GiveStoryEstimate);
    registry.register_command("clearStoryEstimate", handlers::ClearStoryEstimate);
    registry.register_command("newEstimationRound", handlers::NewEstimationRound);

    registry.register_reducer("roomCreated", reducers::room_created);
    registry.register_reducer("joinedRoom", reducers::joined_room);
    registry.register_reducer("leftRoom", reducers::left_room);
    registry.register_reducer("usernameSet", reducers::username_set);
    registry.register_reducer("storyAdded", reducers::story_added);
    registry.register_reducer("storySelected", reducers::story_selected);
    registry.register_reducer("storyEstimateGiven", reducers::story_estimate_given);
    registry.register_reducer("storyEstimateCleared", reducers::story_estimate_cleared);
    registry.register_reducer(
        "newEstimationRoundStarted",
        reducers::new_estimation_round_started,
    );

    registry
}
