//! Port for the overdue loans report.

use async_trait::async_trait;

use crate::domain::Transaction;

use super::GatewayError;

/// Backend view of loans past their due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdueSnapshot {
    /// Count reported by the backend.
    pub total: usize,
    /// The overdue loans.
    pub transactions: Vec<Transaction>,
}

/// Overdue report; staff only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverdueReport: Send + Sync {
    /// Loans still out whose due date has passed.
    async fn overdue_report(&self) -> Result<OverdueSnapshot, GatewayError>;
}
