//! Snapshot codec for the whole session store.
//!
//! A snapshot is a pretty-printed JSON document:
//!
//! ```text
//! {
//!   "version": 1,
//!   "sessions": {
//!     "<session id>": { "id": ..., "topic": ..., "transcript": [ ... ] }
//!   }
//! }
//! ```
//!
//! Sessions are keyed in sorted order, so encoding the same store content
//! always produces the same bytes. Decoding is all-or-nothing: any malformed
//! or inconsistent session rejects the whole snapshot with
//! [`ColloquyError::Format`].

use crate::session::Session;
use crate::store::SessionStore;
use colloquy_core::{ColloquyError, ColloquyResult};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Snapshot schema version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Point-in-time contents of a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub version: u32,
    #[serde(deserialize_with = "unique_sessions")]
    pub sessions: BTreeMap<String, Session>,
}

impl Snapshot {
    /// Checks the version, that every session sits under its own id, and
    /// that no turn id appears in more than one session.
    pub(crate) fn validate(&self) -> ColloquyResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ColloquyError::Format(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        for (key, session) in &self.sessions {
            if key != session.id() {
                return Err(ColloquyError::Format(format!(
                    "session stored under key {key} has id {}",
                    session.id()
                )));
            }
        }
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for session in self.sessions.values() {
            for turn in session.transcript() {
                if let Some(owner) = owners.insert(turn.id.as_str(), session.id()) {
                    return Err(ColloquyError::Format(format!(
                        "turn id {} appears in sessions {owner} and {}",
                        turn.id,
                        session.id()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Decodes the `sessions` map, rejecting a key that appears twice instead of
/// keeping the last entry.
fn unique_sessions<'de, D>(deserializer: D) -> Result<BTreeMap<String, Session>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SessionsVisitor;

    impl<'de> Visitor<'de> for SessionsVisitor {
        type Value = BTreeMap<String, Session>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from session id to session")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut sessions = BTreeMap::new();
            while let Some((key, session)) = map.next_entry::<String, Session>()? {
                match sessions.entry(key) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format!(
                            "session key {} appears more than once",
                            entry.key()
                        )));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(session);
                    }
                }
            }
            Ok(sessions)
        }
    }

    deserializer.deserialize_map(SessionsVisitor)
}

/// Encodes a consistent snapshot of `store`.
pub fn serialize(store: &SessionStore) -> ColloquyResult<Vec<u8>> {
    let snapshot = store.snapshot();
    Ok(serde_json::to_vec_pretty(&snapshot)?)
}

/// Decodes a snapshot into a fresh store. Nothing is returned unless every
/// session decodes and validates.
pub fn deserialize(bytes: &[u8]) -> ColloquyResult<SessionStore> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)
        .map_err(|e| ColloquyError::Format(format!("invalid snapshot: {e}")))?;
    SessionStore::from_snapshot(snapshot)
}

/// Writes a snapshot of `store` to `path`, creating parent directories.
///
/// The bytes go to `{path}.tmp` first and are then renamed over `path`, so a
/// crash mid-write never leaves a truncated snapshot behind.
pub fn save_to_file(store: &SessionStore, path: &Path) -> ColloquyResult<()> {
    let bytes = serialize(store)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    std::fs::write(&temp, &bytes)?;
    std::fs::rename(&temp, path)?;
    info!(path = %path.display(), bytes = bytes.len(), "Snapshot saved");
    Ok(())
}

/// Reads and decodes the snapshot at `path`.
pub fn load_from_file(path: &Path) -> ColloquyResult<SessionStore> {
    let bytes = std::fs::read(path)?;
    let store = deserialize(&bytes)?;
    info!(path = %path.display(), sessions = store.len(), "Snapshot loaded");
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::turn::{Sender, TurnKind};

    fn populated() -> SessionStore {
        let store = SessionStore::new();
        let a = store.create("Design Review", "UI feedback");
        store
            .record(&a, Sender::Agent, "What do you think?", TurnKind::Question)
            .unwrap();
        store
            .record(&a, Sender::Human, "Looks good", TurnKind::Answer)
            .unwrap();
        store.end(&a, "Reviewed");
        let b = store.create("Retro", "");
        store
            .record(&b, Sender::Agent, "What went well?", TurnKind::Question)
            .unwrap();
        store
    }

    #[test]
    fn encoding_is_deterministic() {
        let store = populated();
        assert_eq!(serialize(&store).unwrap(), serialize(&store).unwrap());
    }

    #[test]
    fn roundtrip_preserves_every_session() {
        let store = populated();
        let restored = deserialize(&serialize(&store).unwrap()).unwrap();
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn empty_store_roundtrips() {
        let restored = deserialize(&serialize(&SessionStore::new()).unwrap()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn garbage_is_a_format_error() {
        let err = deserialize(b"{not json").unwrap_err();
        assert!(matches!(err, ColloquyError::Format(_)));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let err = deserialize(br#"{"version": 99, "sessions": {}}"#).unwrap_err();
        assert!(matches!(err, ColloquyError::Format(msg) if msg.contains("99")));
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let store = populated();
        let mut value: serde_json::Value =
            serde_json::from_slice(&serialize(&store).unwrap()).unwrap();
        let sessions = value["sessions"].as_object_mut().unwrap();
        let (key, session) = sessions
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap();
        sessions.remove(&key);
        sessions.insert("someone-else".to_string(), session);

        let err = deserialize(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ColloquyError::Format(_)));
    }

    #[test]
    fn repeated_session_key_is_rejected() {
        let store = populated();
        let text = String::from_utf8(serialize(&store).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let (key, session) = value["sessions"]
            .as_object()
            .unwrap()
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .unwrap();
        // serde_json::Value cannot hold a repeated key, so splice it in by hand.
        let doubled = format!(
            r#"{{"version": {SNAPSHOT_VERSION}, "sessions": {{"{key}": {session}, "{key}": {session}}}}}"#
        );

        let err = deserialize(doubled.as_bytes()).unwrap_err();
        assert!(matches!(err, ColloquyError::Format(msg) if msg.contains("more than once")));
    }

    #[test]
    fn turn_id_shared_between_sessions_is_rejected() {
        let store = populated();
        let mut value: serde_json::Value =
            serde_json::from_slice(&serialize(&store).unwrap()).unwrap();
        let sessions = value["sessions"].as_object_mut().unwrap();
        let mut ids = sessions.keys().cloned();
        let (a, b) = (ids.next().unwrap(), ids.next().unwrap());
        let borrowed = sessions[&a]["transcript"][0]["id"].clone();
        sessions.get_mut(&b).unwrap()["transcript"][0]["id"] = borrowed;

        let err = deserialize(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ColloquyError::Format(msg) if msg.contains("appears in sessions")));
    }

    #[test]
    fn one_bad_session_rejects_the_whole_snapshot() {
        let store = populated();
        let mut value: serde_json::Value =
            serde_json::from_slice(&serialize(&store).unwrap()).unwrap();
        let first = value["sessions"]
            .as_object_mut()
            .unwrap()
            .values_mut()
            .next()
            .unwrap();
        first["transcript"][0]["sender"] = serde_json::json!("robot");

        let err = deserialize(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ColloquyError::Format(_)));
    }
}
