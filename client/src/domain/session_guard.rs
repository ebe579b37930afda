//! Session-aware translation of gateway outcomes.
//!
//! Every service routes backend results through a [`SessionGuard`]. An
//! authorization failure from any call clears the stored session before the
//! error propagates, so the next gate decision sees a signed-out caller.
//! Read paths degrade to an empty result on every other failure.

use std::sync::Arc;

use tracing::warn;

use crate::domain::ports::{GatewayError, SessionStore};
use crate::domain::{AuthorizationGate, DomainError, ErrorCode, Session};

const REJECTED_FALLBACK: &str = "the library service rejected the request";

/// Translate a gateway failure into a domain error.
///
/// Rejection reasons pass through verbatim; a blank reason falls back to a
/// generic message.
pub fn map_gateway_error(error: GatewayError) -> DomainError {
    match error {
        GatewayError::Unauthorized { message } => {
            DomainError::with_fallback(ErrorCode::Unauthorized, message, "not authorized")
        }
        GatewayError::Forbidden { message } => {
            DomainError::with_fallback(ErrorCode::Forbidden, message, "forbidden")
        }
        GatewayError::NotFound { message } => {
            DomainError::with_fallback(ErrorCode::NotFound, message, "not found")
        }
        GatewayError::Rejected { reason } => {
            DomainError::with_fallback(ErrorCode::Rejected, reason, REJECTED_FALLBACK)
        }
        err @ (GatewayError::Timeout { .. } | GatewayError::Transport { .. }) => {
            DomainError::service_unavailable(err.to_string())
        }
        err @ GatewayError::Decode { .. } => DomainError::internal(err.to_string()),
    }
}

/// Clears the session on authorization failures and classifies the rest.
pub struct SessionGuard<S> {
    store: Arc<S>,
}

impl<S> Clone for SessionGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SessionStore> SessionGuard<S> {
    /// Guard over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Underlying session store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.store.get_session()
    }

    /// Refuse early when the caller is signed out or lacks a capability.
    ///
    /// The backend enforces the same rules; checking first avoids a round
    /// trip that can only fail.
    pub fn require(
        &self,
        permitted: impl FnOnce(&AuthorizationGate<'_>) -> bool,
        action: &str,
    ) -> Result<(), DomainError> {
        let Some(session) = self.current() else {
            return Err(DomainError::unauthorized(format!(
                "sign in required to {action}"
            )));
        };
        if permitted(&AuthorizationGate::new(Some(&session))) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!("not permitted to {action}")))
        }
    }

    /// Pass a write result through; every failure propagates.
    pub fn admit<T>(&self, result: Result<T, GatewayError>) -> Result<T, DomainError> {
        result.map_err(|error| self.reject(error))
    }

    /// Pass a read result through, degrading failures to the default value.
    ///
    /// Authorization failures still clear the session and propagate.
    pub fn admit_read<T: Default>(
        &self,
        result: Result<T, GatewayError>,
        what: &str,
    ) -> Result<T, DomainError> {
        match result {
            Ok(value) => Ok(value),
            Err(error) if error.is_unauthorized() => Err(self.reject(error)),
            Err(error) => {
                warn!(%error, resource = what, "read failed; showing empty result");
                Ok(T::default())
            }
        }
    }

    fn reject(&self, error: GatewayError) -> DomainError {
        if error.is_unauthorized() {
            self.expire();
            return DomainError::unauthorized("session expired or invalid; sign in again");
        }
        map_gateway_error(error)
    }

    fn expire(&self) {
        if let Err(error) = self.store.clear_session() {
            warn!(%error, "failed to clear rejected session");
        }
    }
}
