//! Borrow and return use-cases plus loan read models.
//!
//! Lifecycle rules live in the backend; this service gates the calls,
//! surfaces rejection reasons verbatim, and derives overdue state and fines
//! for every loan it hands out, using the injected clock as "now".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{OverdueReport, OverdueSnapshot, SessionStore, TransactionLedger};
use crate::domain::{
    BookId, DomainError, FineAssessment, FineRate, MemberId, SessionGuard, Transaction,
    TransactionId,
};

/// A loan with its derived state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanView {
    /// Loan as reported by the backend.
    pub transaction: Transaction,
    /// Outstanding and past due.
    pub overdue: bool,
    /// Fine owed, backend figure first.
    pub fine: FineAssessment,
}

impl LoanView {
    /// Derive overdue state and fine at `now`.
    pub fn at(transaction: Transaction, now: DateTime<Utc>, rate: FineRate) -> Self {
        let overdue = transaction.is_overdue(now);
        let fine = transaction.assess_fine(now, rate);
        Self {
            transaction,
            overdue,
            fine,
        }
    }

    /// Days past due, rounded up.
    pub const fn days_overdue(&self) -> u64 {
        self.fine.days_overdue
    }

    /// Only outstanding loans offer a return action.
    pub const fn can_return(&self) -> bool {
        self.transaction.is_outstanding()
    }
}

/// Overdue report with derived fines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdueReportView {
    /// Count reported by the backend.
    pub total: usize,
    /// Overdue loans.
    pub entries: Vec<LoanView>,
}

/// Lending desk use-cases.
pub struct LendingService<L, R, S> {
    ledger: Arc<L>,
    reports: Arc<R>,
    guard: SessionGuard<S>,
    clock: Arc<dyn Clock>,
    fine_rate: FineRate,
}

impl<L, R, S> LendingService<L, R, S>
where
    L: TransactionLedger,
    R: OverdueReport,
    S: SessionStore,
{
    /// Service over the ledger and report gateways.
    pub fn new(
        ledger: Arc<L>,
        reports: Arc<R>,
        guard: SessionGuard<S>,
        clock: Arc<dyn Clock>,
        fine_rate: FineRate,
    ) -> Self {
        Self {
            ledger,
            reports,
            guard,
            clock,
            fine_rate,
        }
    }

    /// Derive the view of one loan at the current instant.
    pub fn view(&self, transaction: Transaction) -> LoanView {
        LoanView::at(transaction, self.clock.utc(), self.fine_rate)
    }

    fn views(&self, transactions: Vec<Transaction>) -> Vec<LoanView> {
        let now = self.clock.utc();
        transactions
            .into_iter()
            .map(|transaction| LoanView::at(transaction, now, self.fine_rate))
            .collect()
    }

    /// Lend one copy of `book` to `member`.
    ///
    /// The backend's refusal (no copies, inactive member, unknown ids) is
    /// returned verbatim and never retried.
    pub async fn borrow(&self, book: BookId, member: MemberId) -> Result<LoanView, DomainError> {
        self.guard.require(|gate| gate.can_lend(), "lend books")?;
        let transaction = self.guard.admit(self.ledger.borrow(book, member).await)?;
        info!(
            transaction = %transaction.id,
            book = %book,
            member = %member,
            due = %transaction.due_date,
            "book borrowed"
        );
        Ok(self.view(transaction))
    }

    /// Close an outstanding loan.
    pub async fn return_loan(&self, id: TransactionId) -> Result<LoanView, DomainError> {
        self.guard.require(|gate| gate.can_lend(), "return books")?;
        let transaction = self.guard.admit(self.ledger.return_book(id).await)?;
        info!(
            transaction = %id,
            fine = ?transaction.fine_amount.map(|amount| amount.to_string()),
            "book returned"
        );
        Ok(self.view(transaction))
    }

    /// One loan.
    pub async fn find_loan(&self, id: TransactionId) -> Result<LoanView, DomainError> {
        let transaction = self.guard.admit(self.ledger.find_transaction(id).await)?;
        Ok(self.view(transaction))
    }

    /// Every loan.
    pub async fn list_loans(&self) -> Result<Vec<LoanView>, DomainError> {
        let transactions = self
            .guard
            .admit_read(self.ledger.list_transactions().await, "transactions")?;
        Ok(self.views(transactions))
    }

    /// Loans of one member; `active_only` keeps those still marked borrowed.
    pub async fn loans_for_member(
        &self,
        member: MemberId,
        active_only: bool,
    ) -> Result<Vec<LoanView>, DomainError> {
        let result = if active_only {
            self.ledger.active_for_member(member).await
        } else {
            self.ledger.transactions_for_member(member).await
        };
        let transactions = self.guard.admit_read(result, "member transactions")?;
        Ok(self.views(transactions))
    }

    /// Outstanding loans visible to the signed-in caller.
    pub async fn my_loans(&self) -> Result<Vec<LoanView>, DomainError> {
        let mut loans = self.list_loans().await?;
        loans.retain(LoanView::can_return);
        Ok(loans)
    }

    /// Overdue report with fines.
    pub async fn overdue_report(&self) -> Result<OverdueReportView, DomainError> {
        let OverdueSnapshot {
            total,
            transactions,
        } = self
            .guard
            .admit_read(self.reports.overdue_report().await, "overdue report")?;
        Ok(OverdueReportView {
            total,
            entries: self.views(transactions),
        })
    }
}

#[cfg(test)]
#[path = "lending_service_tests.rs"]
mod tests;
