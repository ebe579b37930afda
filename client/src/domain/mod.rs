//! Domain primitives, lifecycle rules, and driving services.
//!
//! Purpose: model the catalogue, the borrow/return lifecycle, and the
//! session/role gate with strong types, independent of transport. Adapters
//! reach the backend and the session store only through [`ports`].
//!
//! Public surface:
//! - `DomainError` / `ErrorCode`: failure payload handed to inbound adapters.
//! - `Session`, `Principal`, `RoleSet`: who is signed in and what they hold.
//! - `AuthorizationGate`, `View`, `Access`: view and capability decisions.
//! - `Book`, `Member`, `Transaction`: catalogue records and loans.
//! - `SessionService`, `BookCatalogueService`, `MemberDirectoryService`,
//!   `LendingService`, `LendingBoard`: use-cases driven by the CLI.

pub mod auth;
pub mod authorization;
pub mod book;
pub mod catalogue_service;
pub mod error;
pub mod ids;
pub mod lending_board;
pub mod lending_service;
pub mod member;
pub mod money;
pub mod ports;
pub mod refresh;
pub mod role;
pub mod session;
pub mod session_guard;
pub mod session_service;
pub mod transaction;

pub use self::auth::{LoginCredentials, LoginValidationError, SignupRequest};
pub use self::authorization::{Access, AccessPolicy, AuthorizationGate, View};
pub use self::book::{Book, BookDraft, BookValidationError, CopyCount, CopyCountError, Isbn, IsbnError};
pub use self::catalogue_service::{BookCatalogueService, MemberDirectoryService};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::ids::{BookId, IdParseError, MemberId, TransactionId, UserId};
pub use self::lending_board::{BoardSnapshot, LendingBoard, RefreshOutcome};
pub use self::lending_service::{LendingService, LoanView, OverdueReportView};
pub use self::member::{Member, MemberDraft, MemberValidationError};
pub use self::money::{FineRate, Money};
pub use self::refresh::{RefreshGeneration, RefreshTicket};
pub use self::role::{Role, RoleSet, UnknownRoleError};
pub use self::session::{AccessToken, EmptyTokenError, Principal, Session};
pub use self::session_guard::{SessionGuard, map_gateway_error};
pub use self::session_service::SessionService;
pub use self::transaction::{
    BookSummary, FineAssessment, FineSource, LifecycleError, LoanPolicy, MemberSummary,
    Transaction, TransactionStatus,
};

/// Result alias for use-case operations.
///
/// # Examples
/// ```
/// use library_client::domain::{DomainError, DomainResult};
///
/// fn lookup() -> DomainResult<()> {
///     Err(DomainError::not_found("Book not found with id: 4"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, DomainError>;
