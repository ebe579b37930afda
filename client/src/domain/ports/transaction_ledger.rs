//! Port for borrow/return transactions.
//!
//! The backend owns the lifecycle rules: it checks copy availability and
//! member eligibility on borrow, refuses a second return, and computes the
//! fine when a late copy comes back.

use async_trait::async_trait;

use crate::domain::{BookId, MemberId, Transaction, TransactionId};

use super::GatewayError;

/// Loan records and lifecycle transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Every transaction.
    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError>;

    /// One transaction.
    async fn find_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError>;

    /// Every transaction of one member.
    async fn transactions_for_member(
        &self,
        member: MemberId,
    ) -> Result<Vec<Transaction>, GatewayError>;

    /// A member's loans still marked `BORROWED`.
    async fn active_for_member(&self, member: MemberId)
    -> Result<Vec<Transaction>, GatewayError>;

    /// Lend one copy of `book` to `member`.
    async fn borrow(&self, book: BookId, member: MemberId) -> Result<Transaction, GatewayError>;

    /// Close an outstanding loan.
    async fn return_book(&self, id: TransactionId) -> Result<Transaction, GatewayError>;
}
