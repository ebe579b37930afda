//! Domain ports for the hexagonal boundary.
//!
//! Driven ports only: the session store and the backend gateway resources.
//! Each resource has its own trait so services depend on the narrowest
//! surface they use; [`LibraryBackend`] bundles them for adapters that
//! serve every resource.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod book_catalogue;
mod gateway_error;
mod member_directory;
mod overdue_report;
mod session_store;
mod transaction_ledger;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::AuthGateway;
#[cfg(test)]
pub use book_catalogue::MockBookCatalogue;
pub use book_catalogue::BookCatalogue;
pub use gateway_error::GatewayError;
#[cfg(test)]
pub use member_directory::MockMemberDirectory;
pub use member_directory::MemberDirectory;
#[cfg(test)]
pub use overdue_report::MockOverdueReport;
pub use overdue_report::{OverdueReport, OverdueSnapshot};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{MemorySessionStore, SessionStore, SessionStoreError};
#[cfg(test)]
pub use transaction_ledger::MockTransactionLedger;
pub use transaction_ledger::TransactionLedger;

/// Every backend resource behind one adapter.
pub trait LibraryBackend:
    AuthGateway + BookCatalogue + MemberDirectory + TransactionLedger + OverdueReport
{
}

impl<T> LibraryBackend for T where
    T: AuthGateway + BookCatalogue + MemberDirectory + TransactionLedger + OverdueReport
{
}
