#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for colloquy-builtins.
//!
//! These drive the conversation tools through a `SkillRegistry` the way an
//! embedding host would: by name, with JSON arguments, reading JSON replies.

use colloquy_builtins::*;
use colloquy_core::{PromptOutcome, ToolCall};
use colloquy_session::{load_from_file, Sender, SessionStatus, SessionStore, TurnKind};
use colloquy_skills::SkillRegistry;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

fn registry_with(
    store: Arc<SessionStore>,
    channel: Arc<dyn colloquy_core::PromptChannel>,
    snapshot: PathBuf,
) -> SkillRegistry {
    let mut registry = SkillRegistry::new();
    register_conversation_builtins(&mut registry, store, channel, snapshot);
    registry
}

async fn invoke(registry: &SkillRegistry, name: &str, args: Value) -> (bool, Value) {
    let result = registry.execute(ToolCall::new(name, args)).await.unwrap();
    (result.is_error, result.json().unwrap())
}

// ---------------------------------------------------------------------------
// 1. Registry completeness
// ---------------------------------------------------------------------------

#[test]
fn registers_every_conversation_tool() {
    let registry = registry_with(
        Arc::new(SessionStore::new()),
        Arc::new(ScriptedPromptChannel::default()),
        PathBuf::from("unused.json"),
    );
    let expected = [
        "ask_human",
        "continue_conversation",
        "conversation_history",
        "end_conversation",
        "list_conversations",
        "load_conversations",
        "save_conversations",
        "start_conversation",
    ];
    assert_eq!(registry.skill_count(), expected.len());
    let names: Vec<_> = registry
        .list_descriptors()
        .iter()
        .map(|d| d.name.clone())
        .collect();
    assert_eq!(names, expected);
}

// ---------------------------------------------------------------------------
// 2. Full conversation lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn design_review_conversation_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = tmp.path().join("conversations.json");
    let store = Arc::new(SessionStore::new());
    let channel = Arc::new(ScriptedPromptChannel::new([
        PromptOutcome::answered("Looks good"),
        PromptOutcome::Cancelled,
    ]));
    let registry = registry_with(store.clone(), channel, snapshot.clone());

    let (err, started) = invoke(
        &registry,
        "start_conversation",
        json!({"topic": "Design Review", "context": "UI feedback"}),
    )
    .await;
    assert!(!err);
    assert_eq!(started["status"], "conversation_started");
    let id = started["conversation_id"].as_str().unwrap().to_string();

    let (_, replied) = invoke(
        &registry,
        "continue_conversation",
        json!({"conversation_id": id, "message": "What do you think?"}),
    )
    .await;
    assert_eq!(replied["status"], "replied");
    assert_eq!(replied["answer"], "Looks good");

    let (_, cancelled) = invoke(
        &registry,
        "continue_conversation",
        json!({"conversation_id": id, "message": "Anything else?"}),
    )
    .await;
    assert_eq!(cancelled["status"], "cancelled");

    let (_, ended) = invoke(
        &registry,
        "end_conversation",
        json!({"conversation_id": id, "summary": "Reviewed"}),
    )
    .await;
    assert_eq!(ended["status"], "conversation_ended");

    let (err, after_end) = invoke(
        &registry,
        "continue_conversation",
        json!({"conversation_id": id, "message": "follow up"}),
    )
    .await;
    assert!(err);
    assert_eq!(after_end["status"], "error");

    let (_, history) = invoke(
        &registry,
        "conversation_history",
        json!({"conversation_id": id}),
    )
    .await;
    assert_eq!(history["conversation_status"], "ended");
    let contents: Vec<_> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents.len(), 5);
    assert_eq!(contents[1], "What do you think?");
    assert_eq!(contents[2], "Looks good");
    assert_eq!(contents[3], "Anything else?");
    assert!(contents[4].contains("Reviewed"));

    let (_, saved) = invoke(&registry, "save_conversations", json!({})).await;
    assert_eq!(saved["status"], "success");
    let restored = load_from_file(&snapshot).unwrap();
    assert_eq!(restored.snapshot(), store.snapshot());
}

#[tokio::test]
async fn list_reports_counts_in_creation_order() {
    let store = Arc::new(SessionStore::new());
    let registry = registry_with(
        store.clone(),
        Arc::new(ScriptedPromptChannel::default()),
        PathBuf::from("unused.json"),
    );
    let mut ids = Vec::new();
    for topic in ["one", "two", "three"] {
        let (_, started) = invoke(&registry, "start_conversation", json!({"topic": topic})).await;
        ids.push(started["conversation_id"].as_str().unwrap().to_string());
    }
    store.end(&ids[1], "");

    let (_, list) = invoke(&registry, "list_conversations", json!({})).await;
    assert_eq!(list["total_count"], 3);
    assert_eq!(list["active_count"], 2);
    let listed: Vec<_> = list["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["conversation_id"].as_str().unwrap().to_string())
        .collect();
    let mut by_creation: Vec<_> = store.list();
    by_creation.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
    let expected: Vec<_> = by_creation.iter().map(|s| s.id().to_string()).collect();
    assert_eq!(listed, expected);
}

// ---------------------------------------------------------------------------
// 3. The store stays usable while a prompt is outstanding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_is_not_locked_while_waiting_for_the_human() {
    let store = Arc::new(SessionStore::new());
    let id = store.create("interleaved", "");

    let during = store.clone();
    let session = id.clone();
    let channel = CallbackPromptChannel::new(move |_req| {
        let store = during.clone();
        let session = session.clone();
        Box::pin(async move {
            // Another handler writes to the same session mid-prompt.
            store
                .record(&session, Sender::Agent, "side note", TurnKind::Question)
                .unwrap();
            let _ = store.list();
            Ok(PromptOutcome::answered("answer"))
        })
    });
    let registry = registry_with(store.clone(), Arc::new(channel), PathBuf::from("unused.json"));

    let (_, replied) = invoke(
        &registry,
        "continue_conversation",
        json!({"conversation_id": id, "message": "main question"}),
    )
    .await;
    assert_eq!(replied["status"], "replied");

    let contents: Vec<_> = store.history(&id).into_iter().map(|t| t.content).collect();
    assert_eq!(contents[1..], ["main question", "side note", "answer"]);
}

#[tokio::test]
async fn conversation_ended_while_waiting_reports_error() {
    let store = Arc::new(SessionStore::new());
    let id = store.create("raced", "");

    let during = store.clone();
    let session = id.clone();
    let channel = CallbackPromptChannel::new(move |_req| {
        let store = during.clone();
        let session = session.clone();
        Box::pin(async move {
            assert!(store.end(&session, ""));
            Ok(PromptOutcome::answered("too late"))
        })
    });
    let registry = registry_with(store.clone(), Arc::new(channel), PathBuf::from("unused.json"));

    let (err, body) = invoke(
        &registry,
        "continue_conversation",
        json!({"conversation_id": id, "message": "still there?"}),
    )
    .await;
    assert!(err);
    assert_eq!(body["status"], "error");
    assert_eq!(store.get(&id).unwrap().status(), SessionStatus::Ended);
    assert_eq!(store.history(&id).len(), 2);
}

#[tokio::test]
async fn parallel_conversations_do_not_interfere() {
    let store = Arc::new(SessionStore::new());
    let answers: Vec<String> = (0..40).map(|i| format!("answer {i}")).collect();
    let registry = Arc::new(registry_with(
        store.clone(),
        Arc::new(ScriptedPromptChannel::answering(answers)),
        PathBuf::from("unused.json"),
    ));
    let ids: Vec<String> = (0..4).map(|i| store.create(format!("topic {i}"), "")).collect();

    let mut handles = Vec::new();
    for id in ids.clone() {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            for n in 0..10 {
                let (_, body) = invoke(
                    &registry,
                    "continue_conversation",
                    json!({"conversation_id": id, "message": format!("q{n}")}),
                )
                .await;
                assert_eq!(body["status"], "replied");
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for id in &ids {
        let history = store.history(id);
        assert_eq!(history.len(), 21);
        for pair in history[1..].chunks(2) {
            assert_eq!(pair[0].kind, TurnKind::Question);
            assert_eq!(pair[1].kind, TurnKind::Answer);
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Argument validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_arguments_are_error_replies() {
    let registry = registry_with(
        Arc::new(SessionStore::new()),
        Arc::new(ScriptedPromptChannel::default()),
        PathBuf::from("unused.json"),
    );
    for (name, args) in [
        ("start_conversation", json!({"context": "no topic"})),
        ("continue_conversation", json!({"conversation_id": "x"})),
        ("end_conversation", json!({})),
        ("conversation_history", json!({"conversation_id": 7})),
        ("ask_human", json!({"question": ""})),
    ] {
        let (err, body) = invoke(&registry, name, args).await;
        assert!(err, "{name} should reject its arguments");
        assert_eq!(body["status"], "error");
    }
}
