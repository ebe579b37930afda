//! Borrow/return lifecycle, overdue classification, and fines.
//!
//! A transaction is created `BORROWED` and moves to `RETURNED` exactly once.
//! Overdue is never stored: it is derived from the due date and "now" on
//! every read. Fines follow a backend-first policy. An amount reported by the
//! backend is authoritative (an explicit zero included); otherwise the client
//! estimates `days overdue x rate`. The two paths are never combined.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Book, BookId, CopyCountError, FineRate, Member, MemberId, Money, TransactionId};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Wire status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// On loan.
    Borrowed,
    /// Back on the shelf.
    Returned,
    /// Accepted from the wire; treated as an outstanding loan.
    Overdue,
}

impl TransactionStatus {
    /// Whether the copy is still out.
    pub const fn is_outstanding(self) -> bool {
        !matches!(self, Self::Returned)
    }

    /// Canonical wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Borrowed => "BORROWED",
            Self::Returned => "RETURNED",
            Self::Overdue => "OVERDUE",
        }
    }
}

/// Book reference embedded in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    /// Referenced book.
    pub id: BookId,
    /// Title, when the backend embedded it.
    pub title: Option<String>,
    /// Author, when the backend embedded it.
    pub author: Option<String>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: Some(book.title.clone()),
            author: Some(book.author.clone()),
        }
    }
}

/// Member reference embedded in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    /// Referenced member.
    pub id: MemberId,
    /// Given name, when embedded.
    pub first_name: Option<String>,
    /// Family name, when embedded.
    pub last_name: Option<String>,
}

impl MemberSummary {
    /// "First Last", or the id when no names were embedded.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => format!("member #{}", self.id),
        }
    }
}

impl From<&Member> for MemberSummary {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            first_name: Some(member.first_name.clone()),
            last_name: Some(member.last_name.clone()),
        }
    }
}

/// Loan period applied at borrow time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    loan_days: u64,
}

impl LoanPolicy {
    /// Standard two-week loan.
    pub const STANDARD_LOAN_DAYS: u64 = 14;

    /// Policy with a custom loan period.
    pub const fn with_loan_days(loan_days: u64) -> Self {
        Self { loan_days }
    }

    /// Days a copy may be kept.
    pub const fn loan_days(self) -> u64 {
        self.loan_days
    }

    /// Due date for a loan starting on `borrowed`.
    pub fn due_date(self, borrowed: NaiveDate) -> NaiveDate {
        borrowed
            .checked_add_days(Days::new(self.loan_days))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::with_loan_days(Self::STANDARD_LOAN_DAYS)
    }
}

/// Lifecycle rule violations, phrased as the backend reports them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The book has no copy on the shelf.
    #[error("No available copies of this book")]
    NoCopiesAvailable,
    /// The member is not allowed to borrow.
    #[error("Member is not active")]
    MemberInactive,
    /// The transaction was already closed.
    #[error("Book already returned")]
    AlreadyReturned,
    /// Copy accounting refused the transition.
    #[error(transparent)]
    Copies(#[from] CopyCountError),
}

/// Where a fine figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineSource {
    /// Reported by the backend; authoritative.
    Backend,
    /// Estimated by the client from days overdue.
    Estimated,
}

/// Outcome of fine assessment for one loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineAssessment {
    /// Whole days past the due date, rounded up.
    pub days_overdue: u64,
    /// Fine owed.
    pub amount: Money,
    /// Backend figure or client estimate.
    pub source: FineSource,
}

/// A borrow/return transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Backend identifier.
    pub id: TransactionId,
    /// Borrowed book.
    pub book: BookSummary,
    /// Borrowing member.
    pub member: MemberSummary,
    /// Day the copy left the shelf.
    pub borrow_date: NaiveDate,
    /// Day the copy is due back.
    pub due_date: NaiveDate,
    /// Day the copy came back; absent while outstanding.
    pub return_date: Option<NaiveDate>,
    /// Wire status.
    pub status: TransactionStatus,
    /// Fine reported by the backend, once computed.
    pub fine_amount: Option<Money>,
}

impl Transaction {
    /// Open a loan: checks availability then eligibility, and takes a copy.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use library_client::domain::{
    ///     Book, BookDraft, BookId, LoanPolicy, Member, MemberDraft, MemberId, Transaction,
    ///     TransactionId, TransactionStatus,
    /// };
    ///
    /// let draft = BookDraft {
    ///     title: "Dune".into(),
    ///     author: "Frank Herbert".into(),
    ///     isbn: "9780441172719".into(),
    ///     category: None,
    ///     publisher: None,
    ///     publication_date: None,
    ///     total_copies: 2,
    ///     available_copies: None,
    /// };
    /// let (isbn, copies) = draft.validate().unwrap();
    /// let mut book = Book::new(BookId::new(1), &draft, isbn, copies);
    /// let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let member = Member::from_draft(
    ///     MemberId::new(1),
    ///     MemberDraft {
    ///         first_name: "Ada".into(),
    ///         last_name: "Lovelace".into(),
    ///         email: "ada@example.test".into(),
    ///         phone: "555".into(),
    ///         date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
    ///         address: None,
    ///         active: true,
    ///     },
    ///     today,
    /// );
    ///
    /// let loan = Transaction::open(TransactionId::new(1), &mut book, &member, today, LoanPolicy::default())
    ///     .unwrap();
    /// assert_eq!(loan.status, TransactionStatus::Borrowed);
    /// assert_eq!(book.copies().available(), 1);
    /// ```
    pub fn open(
        id: TransactionId,
        book: &mut Book,
        member: &Member,
        today: NaiveDate,
        policy: LoanPolicy,
    ) -> Result<Self, LifecycleError> {
        if !book.copies().can_lend() {
            return Err(LifecycleError::NoCopiesAvailable);
        }
        if !member.active {
            return Err(LifecycleError::MemberInactive);
        }
        book.copies_mut().checkout()?;
        Ok(Self {
            id,
            book: BookSummary::from(&*book),
            member: MemberSummary::from(member),
            borrow_date: today,
            due_date: policy.due_date(today),
            return_date: None,
            status: TransactionStatus::Borrowed,
            fine_amount: None,
        })
    }

    /// Close the loan: puts the copy back and records any backend fine.
    ///
    /// A late return is charged per whole calendar day past the due date.
    /// An on-time return leaves `fine_amount` unset.
    pub fn close(
        &mut self,
        book: &mut Book,
        today: NaiveDate,
        rate: FineRate,
    ) -> Result<(), LifecycleError> {
        if !self.status.is_outstanding() {
            return Err(LifecycleError::AlreadyReturned);
        }
        book.copies_mut().checkin()?;
        self.return_date = Some(today);
        self.status = TransactionStatus::Returned;
        if self.due_date < today {
            let days = (today - self.due_date).num_days();
            self.fine_amount = Some(rate.fine_for_days(days));
        }
        Ok(())
    }

    /// Whether the copy is still out.
    pub const fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }

    /// Outstanding and strictly past the start of the due date (UTC).
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_outstanding() && now > start_of_day(self.due_date)
    }

    /// Days past due, rounded up and floored at zero.
    ///
    /// Outstanding loans are measured at `now`; returned loans at their
    /// return date.
    pub fn days_overdue(&self, now: DateTime<Utc>) -> u64 {
        let reference = match (self.is_outstanding(), self.return_date) {
            (false, Some(returned)) => start_of_day(returned),
            _ => now,
        };
        let late_ms = (reference - start_of_day(self.due_date)).num_milliseconds();
        u64::try_from(late_ms).map_or(0, |ms| ms.div_ceil(MILLIS_PER_DAY))
    }

    /// Fine owed: the backend figure when present, otherwise an estimate.
    pub fn assess_fine(&self, now: DateTime<Utc>, rate: FineRate) -> FineAssessment {
        let days_overdue = self.days_overdue(now);
        match self.fine_amount {
            Some(amount) => FineAssessment {
                days_overdue,
                amount,
                source: FineSource::Backend,
            },
            None => FineAssessment {
                days_overdue,
                amount: rate.fine_for_days(i64::try_from(days_overdue).unwrap_or(i64::MAX)),
                source: FineSource::Estimated,
            },
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
