//! Authentication primitives: sign-in credentials and sign-up requests.
//!
//! Keep operator input parsing outside the services by exposing constructors
//! that validate string inputs before anything reaches a port.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::Role;
use crate::domain::member::is_valid_email;

/// Domain error returned when credential or sign-up values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
    /// Email was blank or not shaped like `local@domain`.
    InvalidEmail,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use library_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada", "secret").unwrap();
/// assert_eq!(creds.username(), "ada");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        Ok(Self {
            username: normalise_username(username)?,
            password: require_password(password)?,
        })
    }

    /// Username string sent to the sign-in endpoint.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated account registration.
///
/// The backend assigns `Member` when no role is requested; this type always
/// names one explicitly so the request is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    username: String,
    email: String,
    password: Zeroizing<String>,
    role: Role,
}

impl SignupRequest {
    /// Validate sign-up form values.
    ///
    /// # Examples
    /// ```
    /// use library_client::domain::{Role, SignupRequest};
    ///
    /// let request = SignupRequest::try_from_parts("bo", "bo@example.test", "pw", Role::Member)
    ///     .unwrap();
    /// assert_eq!(request.role(), Role::Member);
    /// ```
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, LoginValidationError> {
        let username = normalise_username(username)?;
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(LoginValidationError::InvalidEmail);
        }
        Ok(Self {
            username,
            email: email.to_owned(),
            password: require_password(password)?,
            role,
        })
    }

    /// Requested username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Account email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Chosen password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Requested role.
    pub const fn role(&self) -> Role {
        self.role
    }
}

fn normalise_username(username: &str) -> Result<String, LoginValidationError> {
    let normalized = username.trim();
    if normalized.is_empty() {
        return Err(LoginValidationError::EmptyUsername);
    }
    Ok(normalized.to_owned())
}

fn require_password(password: &str) -> Result<Zeroizing<String>, LoginValidationError> {
    if password.is_empty() {
        return Err(LoginValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  librarian  ", "secret")]
    #[case("alice", "correct horse battery staple")]
    fn valid_credentials_trim_username(#[case] username: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(username, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.username(), username.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case("bo", "not-an-email", "pw", LoginValidationError::InvalidEmail)]
    #[case("bo", "", "pw", LoginValidationError::InvalidEmail)]
    #[case(" ", "bo@example.test", "pw", LoginValidationError::EmptyUsername)]
    #[case("bo", "bo@example.test", "", LoginValidationError::EmptyPassword)]
    fn invalid_signup(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = SignupRequest::try_from_parts(username, email, password, Role::Member)
            .expect_err("invalid signup must fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn signup_trims_email_and_keeps_role() {
        let request =
            SignupRequest::try_from_parts("bo", " bo@example.test ", "pw", Role::Librarian)
                .expect("valid signup");
        assert_eq!(request.email(), "bo@example.test");
        assert_eq!(request.role(), Role::Librarian);
    }
}
