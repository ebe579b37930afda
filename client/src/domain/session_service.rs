//! Sign-up, sign-in, and sign-out.
//!
//! A successful sign-in stores token and principal together; sign-out and
//! any authorization failure elsewhere remove both.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::ports::{AuthGateway, GatewayError, SessionStore};
use crate::domain::session_guard::map_gateway_error;
use crate::domain::{
    DomainError, LoginCredentials, LoginValidationError, Role, Session, SignupRequest,
};

/// Account and session use-cases.
pub struct SessionService<A, S> {
    auth: Arc<A>,
    store: Arc<S>,
}

impl<A, S> SessionService<A, S>
where
    A: AuthGateway,
    S: SessionStore,
{
    /// Service over an auth gateway and the session store.
    pub const fn new(auth: Arc<A>, store: Arc<S>) -> Self {
        Self { auth, store }
    }

    /// Register an account. Does not sign in.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<String, DomainError> {
        let request = SignupRequest::try_from_parts(username, email, password, role)
            .map_err(validation_error)?;
        let message = self
            .auth
            .sign_up(&request)
            .await
            .map_err(map_gateway_error)?;
        info!(username = request.username(), role = %role, "account registered");
        Ok(message)
    }

    /// Authenticate and store the resulting session.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let credentials =
            LoginCredentials::try_from_parts(username, password).map_err(validation_error)?;
        let session = self
            .auth
            .sign_in(&credentials)
            .await
            .map_err(|error| match error {
                GatewayError::Unauthorized { .. } => {
                    DomainError::unauthorized("invalid username or password")
                }
                other => map_gateway_error(other),
            })?;
        self.store
            .set_session(&session)
            .map_err(|error| DomainError::internal(error.to_string()))?;
        info!(
            username = session.principal().username(),
            roles = %session.principal().roles(),
            "signed in"
        );
        Ok(session)
    }

    /// Drop the stored session. Signing out twice is not an error.
    pub fn sign_out(&self) -> Result<(), DomainError> {
        self.store
            .clear_session()
            .map_err(|error| DomainError::internal(error.to_string()))?;
        info!("signed out");
        Ok(())
    }

    /// Session currently held.
    pub fn current_session(&self) -> Option<Session> {
        self.store.get_session()
    }
}

fn validation_error(error: LoginValidationError) -> DomainError {
    let field = match error {
        LoginValidationError::EmptyUsername => "username",
        LoginValidationError::EmptyPassword => "password",
        LoginValidationError::InvalidEmail => "email",
    };
    DomainError::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MemorySessionStore, MockAuthGateway};
    use crate::domain::{AccessToken, Principal, RoleSet, UserId};

    fn librarian_session() -> Session {
        Session::new(
            AccessToken::new("jwt-abc").expect("token"),
            Principal::new(
                UserId::new(3),
                "lib",
                Some("lib@example.test".to_owned()),
                RoleSet::from_names(["ROLE_LIBRARIAN"]),
            ),
        )
    }

    fn service(auth: MockAuthGateway) -> SessionService<MockAuthGateway, MemorySessionStore> {
        SessionService::new(Arc::new(auth), Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn sign_in_stores_session() {
        let mut auth = MockAuthGateway::new();
        auth.expect_sign_in()
            .withf(|creds| creds.username() == "lib" && creds.password() == "pw")
            .times(1)
            .returning(|_| Ok(librarian_session()));
        let service = service(auth);

        let session = service.sign_in(" lib ", "pw").await.expect("sign in");
        assert_eq!(session.principal().username(), "lib");
        assert_eq!(service.current_session(), Some(librarian_session()));
    }

    #[tokio::test]
    async fn rejected_credentials_leave_store_empty() {
        let mut auth = MockAuthGateway::new();
        auth.expect_sign_in()
            .returning(|_| Err(GatewayError::unauthorized("Bad credentials")));
        let service = service(auth);

        let err = service.sign_in("lib", "nope").await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "invalid username or password");
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn blank_username_never_reaches_gateway() {
        let mut auth = MockAuthGateway::new();
        auth.expect_sign_in().times(0);
        let service = service(auth);

        let err = service.sign_in("  ", "pw").await.expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details(), Some(&json!({ "field": "username" })));
    }

    #[tokio::test]
    async fn sign_up_surfaces_backend_message() {
        let mut auth = MockAuthGateway::new();
        auth.expect_sign_up()
            .withf(|request| request.role() == Role::Member)
            .returning(|_| Err(GatewayError::rejected("Error: Username is already taken!")));
        let service = service(auth);

        let err = service
            .sign_up("bo", "bo@example.test", "pw", Role::Member)
            .await
            .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Rejected);
        assert_eq!(err.message(), "Error: Username is already taken!");
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let mut auth = MockAuthGateway::new();
        auth.expect_sign_in().returning(|_| Ok(librarian_session()));
        let service = service(auth);
        service.sign_in("lib", "pw").await.expect("sign in");

        service.sign_out().expect("sign out");
        service.sign_out().expect("second sign out");
        assert!(service.current_session().is_none());
    }
}
