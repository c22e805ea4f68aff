//! Full-pipeline lifecycle tests: joining, estimating, and leaving a room
//! driven through the command processor with the built-in catalogue.

use serde_json::{Value, json};

use common::{Room, RoomId, UserId};
use processor::{Command, CommandProcessor, ProcessorError};
use room_store::{InMemoryRoomStore, RoomStore};

fn processor() -> CommandProcessor<InMemoryRoomStore> {
    CommandProcessor::new(InMemoryRoomStore::new(), poker::registry())
}

async fn load(processor: &CommandProcessor<InMemoryRoomStore>, id: &str) -> Room {
    processor
        .store()
        .load(&RoomId::from(id))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn first_join_creates_the_room() {
    let processor = processor();

    let events = processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({"username": "tester1"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["roomCreated", "joinedRoom", "usernameSet"]);
    for event in &events {
        assert_eq!(event.room_id, Some(RoomId::from("ourRoom")));
    }

    let room = load(&processor, "ourRoom").await;
    assert_eq!(
        room.get("users"),
        Some(&json!({"u1": {"username": "tester1"}}))
    );
    assert_eq!(room.get("stories"), Some(&json!({})));
    assert!(room.last_activity().is_some());
}

#[tokio::test]
async fn joining_without_a_room_id_generates_one() {
    let processor = processor();

    let events = processor
        .process(
            Command::without_room("joinRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    // The generated identity comes from the post-apply aggregate and is
    // carried by every event of the run.
    let room_id = events[0].room_id.clone().expect("identity established");
    assert!(events.iter().all(|e| e.room_id == Some(room_id.clone())));

    let room = processor.store().load(&room_id).await.unwrap().unwrap();
    assert_eq!(room.nested("users").unwrap().len(), 1);
}

#[tokio::test]
async fn second_join_does_not_recreate_the_room() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({"username": "tester1"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let events = processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u2"),
        )
        .await
        .unwrap();

    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["joinedRoom"]);

    let room = load(&processor, "ourRoom").await;
    assert_eq!(
        room.get("users"),
        Some(&json!({"u1": {"username": "tester1"}, "u2": {}}))
    );
}

#[tokio::test]
async fn leaving_removes_only_the_leaver() {
    let processor = processor();
    for user in ["u1", "u2"] {
        processor
            .process(
                Command::new("joinRoom", "ourRoom", json!({})),
                UserId::from(user),
            )
            .await
            .unwrap();
    }

    processor
        .process(
            Command::new("leaveRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let room = load(&processor, "ourRoom").await;
    assert_eq!(room.get("users"), Some(&json!({"u2": {}})));
}

#[tokio::test]
async fn estimation_round_trip() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let events = processor
        .process(
            Command::new("addStory", "ourRoom", json!({"title": "feature x"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let story_id = events[0].payload["id"].as_str().unwrap().to_string();

    processor
        .process(
            Command::new("selectStory", "ourRoom", json!({"storyId": story_id})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    processor
        .process(
            Command::new(
                "giveStoryEstimate",
                "ourRoom",
                json!({"storyId": story_id, "value": 8}),
            ),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let room = load(&processor, "ourRoom").await;
    let story = &room.nested("stories").unwrap()[&story_id];
    assert_eq!(story["estimations"], json!({"u1": 8}));
    assert_eq!(room.get("selectedStory"), Some(&json!(story_id)));

    processor
        .process(
            Command::new("newEstimationRound", "ourRoom", json!({"storyId": story_id})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let room = load(&processor, "ourRoom").await;
    let story = &room.nested("stories").unwrap()[&story_id];
    assert_eq!(story["estimations"], json!({}));
}

#[tokio::test]
async fn estimating_an_unselected_story_is_rejected() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let events = processor
        .process(
            Command::new("addStory", "ourRoom", json!({"title": "feature x"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let story_id = events[0].payload["id"].as_str().unwrap().to_string();

    let result = processor
        .process(
            Command::new(
                "giveStoryEstimate",
                "ourRoom",
                json!({"storyId": story_id, "value": 8}),
            ),
            UserId::from("u1"),
        )
        .await;

    assert!(matches!(
        result,
        Err(ProcessorError::Precondition { command_name, .. })
            if command_name == "giveStoryEstimate"
    ));
}

#[tokio::test]
async fn outsiders_cannot_act_on_a_room() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let before = load(&processor, "ourRoom").await;

    let result = processor
        .process(
            Command::new("addStory", "ourRoom", json!({"title": "sneaky"})),
            UserId::from("intruder"),
        )
        .await;

    assert!(matches!(result, Err(ProcessorError::Precondition { .. })));
    assert_eq!(load(&processor, "ourRoom").await, before);
}

#[tokio::test]
async fn leave_requires_an_existing_room() {
    let processor = processor();

    let result = processor
        .process(
            Command::new("leaveRoom", "ghostRoom", json!({})),
            UserId::from("u1"),
        )
        .await;

    // Stale client state after a restart: the room is simply gone.
    assert!(matches!(result, Err(ProcessorError::MissingRoom { .. })));
}

#[tokio::test]
async fn events_from_one_command_rebuild_the_same_room_on_a_replica() {
    let processor = processor();

    let events = processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({"username": "tester1"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    // An observer starts from nothing and applies the broadcast events.
    let replica = poker::registry()
        .apply_all(Room::with_id(&RoomId::from("ourRoom")), &events)
        .unwrap();

    let authoritative = load(&processor, "ourRoom").await;
    assert_eq!(replica.get("users"), authoritative.get("users"));
    assert_eq!(replica.get("stories"), authoritative.get("stories"));
}

#[tokio::test]
async fn last_activity_never_decreases() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let first = load(&processor, "ourRoom").await.last_activity().unwrap();

    processor
        .process(
            Command::new("addStory", "ourRoom", json!({"title": "t"})),
            UserId::from("u1"),
        )
        .await
        .unwrap();
    let second = load(&processor, "ourRoom").await.last_activity().unwrap();

    assert!(second >= first);
}

#[tokio::test]
async fn username_validation_happens_before_events() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let result = processor
        .process(
            Command::new("setUsername", "ourRoom", json!({"username": "  "})),
            UserId::from("u1"),
        )
        .await;

    assert!(matches!(result, Err(ProcessorError::Precondition { .. })));
    let room = load(&processor, "ourRoom").await;
    assert_eq!(room.get("users"), Some(&json!({"u1": {}})));
}

#[tokio::test]
async fn concurrent_joins_to_the_same_room_all_land() {
    let processor = processor();

    let joins: Vec<_> = (0..10)
        .map(|i| {
            processor.process(
                Command::new("joinRoom", "ourRoom", json!({})),
                UserId::from(format!("user{i}").as_str()),
            )
        })
        .collect();
    for outcome in futures_util::future::join_all(joins).await {
        outcome.unwrap();
    }

    let room = load(&processor, "ourRoom").await;
    assert_eq!(room.nested("users").unwrap().len(), 10);
}

#[tokio::test]
async fn story_payload_value_survives_into_state() {
    let processor = processor();
    processor
        .process(
            Command::new("joinRoom", "ourRoom", json!({})),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let events = processor
        .process(
            Command::new(
                "addStory",
                "ourRoom",
                json!({"title": "the new feature x", "description": "will be great!"}),
            ),
            UserId::from("u1"),
        )
        .await
        .unwrap();

    let payload = &events[0].payload;
    assert_eq!(payload["title"], json!("the new feature x"));
    assert_eq!(payload["description"], json!("will be great!"));
    assert_eq!(payload["estimations"], json!({}));
    assert!(payload["id"].as_str().is_some());

    let room = load(&processor, "ourRoom").await;
    let stories = room.nested("stories").unwrap();
    let story: &Value = stories.values().next().unwrap();
    assert_eq!(story, payload);
}
