//! Lending desk state: loans plus the books and members a loan can use.
//!
//! The three lists load concurrently. Each load takes a refresh ticket, and
//! its results are applied only while that ticket is still current, so a
//! slow reload finishing after a newer one cannot overwrite fresher data.

use std::sync::{Mutex, PoisonError};

use futures_util::try_join;
use tracing::{debug, warn};

use crate::domain::ports::{BookCatalogue, MemberDirectory, OverdueReport, SessionStore, TransactionLedger};
use crate::domain::{
    Book, BookCatalogueService, BookId, DomainError, LendingService, LoanView, Member,
    MemberDirectoryService, MemberId, RefreshGeneration, RefreshTicket, TransactionId,
};

/// Lists shown on the lending desk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Every loan.
    pub loans: Vec<LoanView>,
    /// Books with a copy on the shelf.
    pub lendable_books: Vec<Book>,
    /// Members eligible to borrow.
    pub active_members: Vec<Member>,
}

/// Whether a reload's results were kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The board now shows this reload.
    Applied,
    /// A newer reload started first; these results were dropped.
    Discarded,
}

/// Lending desk combining loans, catalogue, and members.
pub struct LendingBoard<L, R, C, M, S> {
    lending: LendingService<L, R, S>,
    books: BookCatalogueService<C, S>,
    members: MemberDirectoryService<M, S>,
    generation: RefreshGeneration,
    state: Mutex<BoardSnapshot>,
}

impl<L, R, C, M, S> LendingBoard<L, R, C, M, S>
where
    L: TransactionLedger,
    R: OverdueReport,
    C: BookCatalogue,
    M: MemberDirectory,
    S: SessionStore,
{
    /// Empty board over the three services.
    pub fn new(
        lending: LendingService<L, R, S>,
        books: BookCatalogueService<C, S>,
        members: MemberDirectoryService<M, S>,
    ) -> Self {
        Self {
            lending,
            books,
            members,
            generation: RefreshGeneration::new(),
            state: Mutex::new(BoardSnapshot::default()),
        }
    }

    /// Lending use-cases backing the board.
    pub fn lending(&self) -> &LendingService<L, R, S> {
        &self.lending
    }

    /// Reload every list concurrently.
    pub async fn refresh(&self) -> Result<RefreshOutcome, DomainError> {
        let ticket = self.generation.begin();
        let (loans, lendable_books, active_members) = try_join!(
            self.lending.list_loans(),
            self.books.lendable(),
            self.members.active(),
        )?;
        Ok(self.apply(
            ticket,
            BoardSnapshot {
                loans,
                lendable_books,
                active_members,
            },
        ))
    }

    /// Install `snapshot` if `ticket` is still the latest reload.
    pub fn apply(&self, ticket: RefreshTicket, snapshot: BoardSnapshot) -> RefreshOutcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.generation.is_current(ticket) {
            debug!(generation = ticket.generation(), "discarding stale board reload");
            return RefreshOutcome::Discarded;
        }
        *state = snapshot;
        RefreshOutcome::Applied
    }

    /// Start a reload without fetching; used by callers that load the data
    /// themselves.
    pub fn begin_refresh(&self) -> RefreshTicket {
        self.generation.begin()
    }

    /// Lists currently shown.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Borrow, then reload the board.
    ///
    /// The loan is reported once recorded; a failed reload only leaves the
    /// board stale.
    pub async fn borrow(&self, book: BookId, member: MemberId) -> Result<LoanView, DomainError> {
        let view = self.lending.borrow(book, member).await?;
        self.reload_after("borrow", &view).await;
        Ok(view)
    }

    /// Return, then reload the board. Reload failures are logged as for
    /// [`LendingBoard::borrow`].
    pub async fn return_loan(&self, id: TransactionId) -> Result<LoanView, DomainError> {
        let view = self.lending.return_loan(id).await?;
        self.reload_after("return", &view).await;
        Ok(view)
    }

    async fn reload_after(&self, action: &'static str, view: &LoanView) {
        if let Err(error) = self.refresh().await {
            warn!(
                action,
                transaction = %view.transaction.id,
                code = ?error.code(),
                %error,
                "board reload failed after a recorded loan change"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use mockable::Clock;

    use super::*;
    use crate::domain::ports::{
        GatewayError, MemorySessionStore, MockBookCatalogue, MockMemberDirectory,
        MockOverdueReport, MockTransactionLedger,
    };
    use crate::domain::{
        AccessToken, BookDraft, BookSummary, ErrorCode, FineRate, MemberSummary, Principal, Role,
        RoleSet, Session, SessionGuard, Transaction, TransactionStatus, UserId,
    };

    struct FixtureClock;

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0)
                .single()
                .unwrap_or_default()
        }
    }

    type Board = LendingBoard<
        MockTransactionLedger,
        MockOverdueReport,
        MockBookCatalogue,
        MockMemberDirectory,
        MemorySessionStore,
    >;

    fn board(
        ledger: MockTransactionLedger,
        catalogue: MockBookCatalogue,
        directory: MockMemberDirectory,
    ) -> (Board, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::with_session(Session::new(
            AccessToken::new("tok").expect("token"),
            Principal::new(
                UserId::new(1),
                "desk",
                None,
                [Role::Librarian].into_iter().collect::<RoleSet>(),
            ),
        )));
        let guard = SessionGuard::new(Arc::clone(&store));
        let board = LendingBoard::new(
            LendingService::new(
                Arc::new(ledger),
                Arc::new(MockOverdueReport::new()),
                guard.clone(),
                Arc::new(FixtureClock),
                FineRate::default(),
            ),
            BookCatalogueService::new(Arc::new(catalogue), guard.clone()),
            MemberDirectoryService::new(Arc::new(directory), guard),
        );
        (board, store)
    }

    fn book(id: i64, available: u32) -> Book {
        let draft = BookDraft {
            title: format!("Book {id}"),
            author: "Author".to_owned(),
            isbn: "9780000000002".to_owned(),
            category: None,
            publisher: None,
            publication_date: None,
            total_copies: 2,
            available_copies: Some(available),
        };
        let (isbn, copies) = draft.validate().expect("valid book");
        Book::new(BookId::new(id), &draft, isbn, copies)
    }

    #[tokio::test]
    async fn refresh_loads_all_lists() {
        let mut ledger = MockTransactionLedger::new();
        ledger.expect_list_transactions().returning(|| Ok(Vec::new()));
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_list_books()
            .returning(|| Ok(vec![book(1, 0), book(2, 1)]));
        let mut directory = MockMemberDirectory::new();
        directory.expect_list_members().returning(|| Ok(Vec::new()));
        let (board, _) = board(ledger, catalogue, directory);

        assert_eq!(board.refresh().await.expect("refresh"), RefreshOutcome::Applied);
        let snapshot = board.snapshot();
        assert_eq!(snapshot.lendable_books.len(), 1);
        assert_eq!(
            snapshot.lendable_books.first().map(|b| b.id),
            Some(BookId::new(2))
        );
    }

    #[test]
    fn stale_reload_is_discarded() {
        let (board, _) = board(
            MockTransactionLedger::new(),
            MockBookCatalogue::new(),
            MockMemberDirectory::new(),
        );
        let slow = board.begin_refresh();
        let fast = board.begin_refresh();
        let fresh = BoardSnapshot {
            lendable_books: vec![book(7, 2)],
            ..BoardSnapshot::default()
        };

        assert_eq!(board.apply(fast, fresh.clone()), RefreshOutcome::Applied);
        assert_eq!(
            board.apply(slow, BoardSnapshot::default()),
            RefreshOutcome::Discarded
        );
        assert_eq!(board.snapshot(), fresh);
    }

    #[tokio::test]
    async fn unauthorized_list_aborts_refresh_and_signs_out() {
        let mut ledger = MockTransactionLedger::new();
        ledger
            .expect_list_transactions()
            .returning(|| Err(GatewayError::unauthorized("expired")));
        let mut catalogue = MockBookCatalogue::new();
        catalogue.expect_list_books().returning(|| Ok(Vec::new()));
        let mut directory = MockMemberDirectory::new();
        directory.expect_list_members().returning(|| Ok(Vec::new()));
        let (board, store) = board(ledger, catalogue, directory);

        let err = board.refresh().await.expect_err("unauthorized");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(store.get_session().is_none());
        assert_eq!(board.snapshot(), BoardSnapshot::default());
    }

    #[tokio::test]
    async fn recorded_borrow_survives_a_failed_reload() {
        let mut ledger = MockTransactionLedger::new();
        ledger.expect_borrow().times(1).returning(|book, member| {
            Ok(Transaction {
                id: TransactionId::new(30),
                book: BookSummary {
                    id: book,
                    title: None,
                    author: None,
                },
                member: MemberSummary {
                    id: member,
                    first_name: None,
                    last_name: None,
                },
                borrow_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
                due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap_or_default(),
                return_date: None,
                status: TransactionStatus::Borrowed,
                fine_amount: None,
            })
        });
        ledger
            .expect_list_transactions()
            .returning(|| Err(GatewayError::unauthorized("expired")));
        let mut catalogue = MockBookCatalogue::new();
        catalogue.expect_list_books().returning(|| Ok(Vec::new()));
        let mut directory = MockMemberDirectory::new();
        directory.expect_list_members().returning(|| Ok(Vec::new()));
        let (board, store) = board(ledger, catalogue, directory);

        let view = board
            .borrow(BookId::new(2), MemberId::new(3))
            .await
            .expect("loan recorded");
        assert_eq!(view.transaction.id, TransactionId::new(30));
        assert!(view.can_return());
        assert!(store.get_session().is_none());
    }
}
