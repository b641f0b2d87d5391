use crate::transcript::Transcript;
use crate::turn::{Sender, Turn, TurnKind};
use chrono::{DateTime, Utc};
use colloquy_core::{new_id, ColloquyError, ColloquyResult};
use serde::{Deserialize, Serialize, Serializer};

/// Lifecycle of a [`Session`]. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversational context: a topic, free-form context, a status and the
/// transcript of everything said so far.
///
/// Built only through [`Session::open`] (or by decoding a snapshot, which
/// re-checks every invariant), so a session always has at least its opening
/// system turn and `created_at <= updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    id: String,
    topic: String,
    context: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: SessionStatus,
    transcript: Transcript,
}

impl Session {
    /// Opens a new active session with its "session started" system turn.
    pub fn open(topic: impl Into<String>, context: impl Into<String>) -> Self {
        let id = new_id();
        let topic = topic.into();
        let mut transcript = Transcript::new(id.clone());
        let opening = transcript.append(
            Sender::System,
            format!("Session started: {topic}"),
            TurnKind::System,
        );
        Self {
            id,
            topic,
            context: context.into(),
            created_at: opening.timestamp,
            updated_at: opening.timestamp,
            status: SessionStatus::Active,
            transcript,
        }
    }

    /// Appends a turn. Ended sessions reject every append.
    pub fn record(
        &mut self,
        sender: Sender,
        content: impl Into<String>,
        kind: TurnKind,
    ) -> ColloquyResult<Turn> {
        if self.status == SessionStatus::Ended {
            return Err(ColloquyError::InvalidState(format!(
                "session {} has ended",
                self.id
            )));
        }
        let turn = self.transcript.append(sender, content, kind);
        self.updated_at = turn.timestamp;
        Ok(turn)
    }

    /// Ends the session. A non-empty `summary` is recorded as a final system
    /// turn while the session is still active. Closing twice is an error.
    pub fn close(&mut self, summary: &str) -> ColloquyResult<()> {
        if !summary.is_empty() {
            self.record(
                Sender::System,
                format!("Session ended: {summary}"),
                TurnKind::System,
            )?;
        } else if self.status == SessionStatus::Ended {
            return Err(ColloquyError::InvalidState(format!(
                "session {} has already ended",
                self.id
            )));
        }
        self.status = SessionStatus::Ended;
        self.updated_at = self.updated_at.max(Utc::now());
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turn_count(&self) -> usize {
        self.transcript.len()
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SessionRecordRef<'a> {
    id: &'a str,
    topic: &'a str,
    context: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: SessionStatus,
    transcript: &'a [Turn],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionRecord {
    id: String,
    topic: String,
    context: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: SessionStatus,
    transcript: Vec<Turn>,
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SessionRecordRef {
            id: &self.id,
            topic: &self.topic,
            context: &self.context,
            created_at: self.created_at,
            updated_at: self.updated_at,
            status: self.status,
            transcript: self.transcript.as_slice(),
        }
        .serialize(serializer)
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = String;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        if record.id.is_empty() {
            return Err("session id must not be empty".to_string());
        }
        if record.created_at > record.updated_at {
            return Err(format!(
                "session {} was updated before it was created",
                record.id
            ));
        }
        if record.transcript.is_empty() {
            return Err(format!("session {} has an empty transcript", record.id));
        }
        let transcript = Transcript::from_turns(&record.id, record.transcript)?;
        if let Some(first) = transcript.as_slice().first() {
            if first.timestamp < record.created_at {
                return Err(format!(
                    "session {} has turn {} older than the session itself",
                    record.id, first.id
                ));
            }
        }
        if let Some(last) = transcript.last() {
            if last.timestamp > record.updated_at {
                return Err(format!(
                    "session {} has updated_at before its latest turn {}",
                    record.id, last.id
                ));
            }
        }
        Ok(Self {
            id: record.id,
            topic: record.topic,
            context: record.context,
            created_at: record.created_at,
            updated_at: record.updated_at,
            status: record.status,
            transcript,
        })
    }
}
