use crate::response::{failure, finish, optional_str, success, Reply};
use async_trait::async_trait;
use colloquy_core::{ColloquyResult, ToolCall, ToolResult};
use colloquy_session::{load_from_file, save_to_file, SessionStore};
use colloquy_skills::skill::{Skill, SkillDescriptor};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;

fn path_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Snapshot file; defaults to the configured snapshot file"
            }
        }
    })
}

fn resolve(call: &ToolCall, default_path: &Path) -> PathBuf {
    match optional_str(call, "path") {
        "" => default_path.to_path_buf(),
        path => PathBuf::from(path),
    }
}

/// Writes every conversation to a snapshot file.
pub struct SaveConversationsSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
    default_path: PathBuf,
}

impl SaveConversationsSkill {
    pub fn new(store: Arc<SessionStore>, default_path: PathBuf) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "save_conversations".to_string(),
                description: "Save all conversations to a snapshot file.".to_string(),
                parameters_schema: path_schema(),
            },
            store,
            default_path,
        }
    }

    fn run(&self, call: &ToolCall) -> Reply {
        let path = resolve(call, &self.default_path);
        save_to_file(&self.store, &path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Saving conversations failed");
            failure(call, None, format!("Failed to save conversations: {e}"))
        })?;
        Ok(success(
            call,
            json!({
                "status": "success",
                "path": path.display().to_string(),
                "session_count": self.store.len(),
            }),
        ))
    }
}

#[async_trait]
impl Skill for SaveConversationsSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call)))
    }
}

/// Replaces every conversation with the contents of a snapshot file.
/// A failed load leaves the current conversations untouched.
pub struct LoadConversationsSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
    default_path: PathBuf,
}

impl LoadConversationsSkill {
    pub fn new(store: Arc<SessionStore>, default_path: PathBuf) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "load_conversations".to_string(),
                description: "Replace all conversations with those saved in a snapshot file."
                    .to_string(),
                parameters_schema: path_schema(),
            },
            store,
            default_path,
        }
    }

    fn run(&self, call: &ToolCall) -> Reply {
        let path = resolve(call, &self.default_path);
        let loaded = load_from_file(&path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Loading conversations failed");
            failure(call, None, format!("Failed to load conversations: {e}"))
        })?;
        let count = loaded.len();
        self.store.replace_with(loaded);
        Ok(success(
            call,
            json!({
                "status": "success",
                "path": path.display().to_string(),
                "session_count": count,
            }),
        ))
    }
}

#[async_trait]
impl Skill for LoadConversationsSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_load_into_another_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.json");

        let source = Arc::new(SessionStore::new());
        let id = source.create("kept", "");
        let saved = SaveConversationsSkill::new(source, path.clone())
            .execute(ToolCall::new("save_conversations", json!({})))
            .await
            .unwrap();
        assert_eq!(saved.json().unwrap()["session_count"], 1);

        let target = Arc::new(SessionStore::new());
        target.create("discarded", "");
        let loaded = LoadConversationsSkill::new(target.clone(), PathBuf::from("unused.json"))
            .execute(ToolCall::new(
                "load_conversations",
                json!({"path": path.display().to_string()}),
            ))
            .await
            .unwrap();
        assert!(!loaded.is_error);
        assert_eq!(target.len(), 1);
        assert_eq!(target.get(&id).unwrap().topic(), "kept");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_current_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new());
        let id = store.create("current", "");

        let result = LoadConversationsSkill::new(store.clone(), tmp.path().join("missing.json"))
            .execute(ToolCall::new("load_conversations", json!({})))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(store.get(&id).is_some());
    }
}
