//! Port for holding the active session.
//!
//! The store owns at most one [`Session`]. Token and principal are written
//! and cleared together; readers never observe one without the other.
//! Reads are infallible: a store that cannot produce a valid session reports
//! none, so every gate decision degrades to "not signed in".

use std::sync::{PoisonError, RwLock};

use crate::domain::Session;

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or removing the session.
    pub enum SessionStoreError {
        /// The session could not be written.
        Write {
            /// Human-readable detail.
            message: String,
        } => "session store write failed: {message}",
        /// The persisted session could not be removed.
        Clear {
            /// Human-readable detail.
            message: String,
        } => "session store clear failed: {message}",
    }
}

/// Storage for the single active session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Replace any prior session with `session`.
    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Current session, if one is held.
    fn get_session(&self) -> Option<Session>;

    /// Drop the session. Clearing an empty store succeeds.
    fn clear_session(&self) -> Result<(), SessionStoreError>;
}

/// Process-local session store.
///
/// Writes are last-writer-wins; a poisoned lock is recovered because the
/// guarded value is replaced wholesale on every write.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn get_session(&self) -> Option<Session> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        (**self).set_session(session)
    }

    fn get_session(&self) -> Option<Session> {
        (**self).get_session()
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        (**self).clear_session()
    }
}
