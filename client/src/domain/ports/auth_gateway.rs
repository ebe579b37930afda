//! Port for account registration and sign-in.

use async_trait::async_trait;

use crate::domain::{LoginCredentials, Session, SignupRequest};

use super::GatewayError;

/// Backend authentication endpoints.
///
/// Neither call carries a bearer token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register an account; returns the backend's confirmation message.
    async fn sign_up(&self, request: &SignupRequest) -> Result<String, GatewayError>;

    /// Exchange credentials for a token and principal.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, GatewayError>;
}
