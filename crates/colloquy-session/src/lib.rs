//! Conversation sessions and the store that owns them.
//!
//! A [`Session`] wraps an append-only [`Transcript`] of [`Turn`]s together
//! with a topic, free-form context and an `active → ended` lifecycle. The
//! [`SessionStore`] keys sessions by id, mediates every mutation and can be
//! encoded to (and rebuilt from) a [`Snapshot`] via the [`snapshot`] codec.

pub mod session;
pub mod snapshot;
pub mod store;
pub mod transcript;
pub mod turn;

pub use session::{Session, SessionStatus};
pub use snapshot::{deserialize, load_from_file, save_to_file, serialize, Snapshot};
pub use store::SessionStore;
pub use transcript::Transcript;
pub use turn::{Sender, Turn, TurnKind};
