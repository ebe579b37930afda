//! Library member records.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::domain::MemberId;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; deliverability is the backend's concern.
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Whether `email` looks like `local@domain.tld`.
pub(crate) fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Validation failures for member form values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberValidationError {
    /// A required text field was blank.
    #[error("{field} must not be empty")]
    MissingField {
        /// Name of the blank field.
        field: &'static str,
    },
    /// The email address is malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// No date of birth was supplied.
    #[error("date of birth is required")]
    MissingDateOfBirth,
}

impl MemberValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
            Self::InvalidEmail => "email",
            Self::MissingDateOfBirth => "dateOfBirth",
        }
    }
}

/// Member form values submitted for create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDraft {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email; unique per library.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Postal address.
    pub address: Option<String>,
    /// Whether the member may borrow.
    pub active: bool,
}

impl MemberDraft {
    /// Check required fields and the email shape.
    pub fn validate(&self) -> Result<(), MemberValidationError> {
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phoneNumber", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(MemberValidationError::MissingField { field });
            }
        }
        if !is_valid_email(self.email.trim()) {
            return Err(MemberValidationError::InvalidEmail);
        }
        if self.date_of_birth.is_none() {
            return Err(MemberValidationError::MissingDateOfBirth);
        }
        Ok(())
    }
}

/// A library member as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Backend identifier.
    pub id: MemberId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Date of birth, when recorded.
    pub date_of_birth: Option<NaiveDate>,
    /// Postal address.
    pub address: Option<String>,
    /// Date the membership started.
    pub membership_start: Option<NaiveDate>,
    /// Only active members are eligible to borrow.
    pub active: bool,
}

impl Member {
    /// Build a member record from validated form values.
    pub fn from_draft(id: MemberId, draft: MemberDraft, membership_start: NaiveDate) -> Self {
        Self {
            id,
            first_name: draft.first_name.trim().to_owned(),
            last_name: draft.last_name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            phone: draft.phone.trim().to_owned(),
            date_of_birth: draft.date_of_birth,
            address: draft.address,
            membership_start: Some(membership_start),
            active: draft.active,
        }
    }

    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
