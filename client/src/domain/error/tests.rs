//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn invalid_request_constructor_sets_code() {
    let err = DomainError::invalid_request("bad");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::unauthorized(DomainError::unauthorized("x"), ErrorCode::Unauthorized)]
#[case::forbidden(DomainError::forbidden("x"), ErrorCode::Forbidden)]
#[case::not_found(DomainError::not_found("x"), ErrorCode::NotFound)]
#[case::rejected(DomainError::rejected("x"), ErrorCode::Rejected)]
#[case::unavailable(DomainError::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case::internal(DomainError::internal("x"), ErrorCode::InternalError)]
fn convenience_constructors_set_codes(#[case] err: DomainError, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = DomainError::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(DomainErrorValidationError::EmptyMessage)));
}

#[rstest]
#[case("No available copies of this book", "No available copies of this book")]
#[case("", "Error borrowing book. Please try again.")]
#[case("\n\t", "Error borrowing book. Please try again.")]
fn with_fallback_keeps_reason_verbatim_or_substitutes(
    #[case] reason: &str,
    #[case] expected: &str,
) {
    let err = DomainError::with_fallback(
        ErrorCode::Rejected,
        reason,
        "Error borrowing book. Please try again.",
    );
    assert_eq!(err.message(), expected);
    assert_eq!(err.code(), ErrorCode::Rejected);
}

#[rstest]
fn serialises_with_snake_case_code_and_optional_details() {
    let err = DomainError::invalid_request("isbn is malformed").with_details(json!({"field": "isbn"}));
    let value = serde_json::to_value(&err).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "isbn is malformed",
            "details": {"field": "isbn"}
        })
    );

    let plain = serde_json::to_value(DomainError::not_found("gone")).expect("serialise error");
    assert!(plain.get("details").is_none());
}

#[rstest]
fn deserialising_blank_message_fails() {
    let payload = json!({"code": "rejected", "message": "  "});
    let result = serde_json::from_value::<DomainError>(payload);
    assert!(result.is_err());
}

#[rstest]
fn display_uses_message() {
    assert_eq!(DomainError::rejected("Book already returned").to_string(), "Book already returned");
}
