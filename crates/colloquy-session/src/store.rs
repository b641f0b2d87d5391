use crate::session::{Session, SessionStatus};
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::turn::{Sender, Turn, TurnKind};
use colloquy_core::{ColloquyError, ColloquyResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide keyed collection of sessions.
///
/// Construct one empty store at startup and hand it out as
/// `Arc<SessionStore>`. The store owns every session; readers always get
/// copies.
///
/// Every operation is synchronous and short. Each session sits behind its
/// own mutex, and all session locks are taken while holding the map's read
/// lock, so appends to the same session serialize while appends to different
/// sessions proceed in parallel. [`snapshot`](Self::snapshot) takes the map's
/// write lock, which excludes every in-flight mutation and yields a
/// point-in-time copy.
///
/// Failure style differs per operation and callers depend on it: `record`
/// raises `NotFound` / `InvalidState`, while `get`, `end`, `delete` and
/// `history` report absence through `None`, `false` or an empty vector.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot, rejecting it with `Format` when the
    /// version is unknown, a session sits under another session's id, or a
    /// turn id is shared between sessions.
    pub fn from_snapshot(snapshot: Snapshot) -> ColloquyResult<Self> {
        snapshot.validate()?;
        let sessions = snapshot
            .sessions
            .into_iter()
            .map(|(id, session)| (id, Arc::new(Mutex::new(session))))
            .collect();
        Ok(Self {
            sessions: RwLock::new(sessions),
        })
    }

    /// Opens a session and registers it. Returns the new session id.
    pub fn create(&self, topic: impl Into<String>, context: impl Into<String>) -> String {
        let session = Session::open(topic, context);
        let id = session.id().to_string();
        info!(session_id = %id, topic = %session.topic(), "Session created");
        self.sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    /// Appends a turn to an active session and returns it.
    pub fn record(
        &self,
        session_id: &str,
        sender: Sender,
        content: impl Into<String>,
        kind: TurnKind,
    ) -> ColloquyResult<Turn> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| ColloquyError::NotFound(session_id.to_string()))?;
        let turn = entry.lock().record(sender, content, kind)?;
        debug!(
            session_id = %session_id,
            turn_id = %turn.id,
            sender = %sender,
            kind = %kind,
            "Turn recorded"
        );
        Ok(turn)
    }

    /// A copy of the session, or `None` when the id is unknown.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .read()
            .get(session_id)
            .map(|entry| entry.lock().clone())
    }

    /// Copies of every session.
    ///
    /// The order is unspecified and may change between calls after any
    /// mutation; callers that need an order should sort on `created_at`.
    pub fn list(&self) -> Vec<Session> {
        self.sessions
            .read()
            .values()
            .map(|entry| entry.lock().clone())
            .collect()
    }

    /// Copies of the sessions currently in `status`, unordered like [`list`](Self::list).
    pub fn list_by_status(&self, status: SessionStatus) -> Vec<Session> {
        self.sessions
            .read()
            .values()
            .filter_map(|entry| {
                let session = entry.lock();
                (session.status() == status).then(|| session.clone())
            })
            .collect()
    }

    /// Ends a session, appending `summary` first when it is non-empty.
    ///
    /// Returns `false` without touching anything when the session is unknown
    /// or has already ended.
    pub fn end(&self, session_id: &str, summary: &str) -> bool {
        let sessions = self.sessions.read();
        let Some(entry) = sessions.get(session_id) else {
            debug!(session_id = %session_id, "End requested for unknown session");
            return false;
        };
        let mut session = entry.lock();
        if !session.is_active() {
            debug!(session_id = %session_id, "End requested for ended session");
            return false;
        }
        match session.close(summary) {
            Ok(()) => {
                info!(
                    session_id = %session_id,
                    turns = session.turn_count(),
                    "Session ended"
                );
                true
            }
            Err(_) => false,
        }
    }

    /// Removes a session whatever its status. Returns whether it existed.
    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, "Session deleted");
        }
        removed
    }

    /// The session's turns in order, or an empty vector for an unknown id.
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .get(session_id)
            .map(|entry| entry.lock().transcript().to_sequence())
            .unwrap_or_default()
    }

    /// Number of turns in a session, `None` for an unknown id.
    pub fn turn_count(&self, session_id: &str) -> Option<usize> {
        self.sessions
            .read()
            .get(session_id)
            .map(|entry| entry.lock().turn_count())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|entry| entry.lock().is_active())
            .count()
    }

    /// A consistent point-in-time copy of every session, keyed by id.
    pub fn snapshot(&self) -> Snapshot {
        let sessions = self.sessions.write();
        let copied: BTreeMap<String, Session> = sessions
            .iter()
            .map(|(id, entry)| (id.clone(), entry.lock().clone()))
            .collect();
        Snapshot {
            version: SNAPSHOT_VERSION,
            sessions: copied,
        }
    }

    /// Replaces the whole contents of this store with `other`'s in one step.
    /// Returns how many sessions were dropped.
    pub fn replace_with(&self, other: SessionStore) -> usize {
        let incoming = other.sessions.into_inner();
        let count = incoming.len();
        let previous = std::mem::replace(&mut *self.sessions.write(), incoming);
        info!(
            dropped = previous.len(),
            loaded = count,
            "Session store replaced"
        );
        previous.len()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .finish()
    }
}
