//! End-to-end lending scenarios over the in-memory backend.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use library_client::domain::ports::{MemorySessionStore, SessionStore};
use library_client::domain::{
    Access, AuthorizationGate, BookCatalogueService, BookDraft, ErrorCode, FineRate, FineSource,
    LendingService, MemberDirectoryService, MemberDraft, Money, Role, SessionGuard,
    SessionService, TransactionStatus, View,
};
use library_client::outbound::memory::InMemoryLibrary;
use mockable::Clock;
use rstest::{fixture, rstest};

type Backend = InMemoryLibrary<Arc<MemorySessionStore>>;

struct CalendarClock(Mutex<DateTime<Utc>>);

impl CalendarClock {
    fn advance_days(&self, days: u64) {
        let mut now = self.0.lock().expect("clock lock");
        *now = now.checked_add_days(Days::new(days)).expect("in range");
    }
}

impl Clock for CalendarClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

struct Library {
    backend: Arc<Backend>,
    store: Arc<MemorySessionStore>,
    clock: Arc<CalendarClock>,
    sessions: SessionService<Backend, MemorySessionStore>,
    books: BookCatalogueService<Backend, MemorySessionStore>,
    members: MemberDirectoryService<Backend, MemorySessionStore>,
    lending: LendingService<Backend, Backend, MemorySessionStore>,
}

#[fixture]
fn library() -> Library {
    let store = Arc::new(MemorySessionStore::new());
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid start");
    let clock = Arc::new(CalendarClock(Mutex::new(start)));
    let backend = Arc::new(InMemoryLibrary::new(
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let guard = SessionGuard::new(Arc::clone(&store));
    Library {
        sessions: SessionService::new(Arc::clone(&backend), Arc::clone(&store)),
        books: BookCatalogueService::new(Arc::clone(&backend), guard.clone()),
        members: MemberDirectoryService::new(Arc::clone(&backend), guard.clone()),
        lending: LendingService::new(
            Arc::clone(&backend),
            Arc::clone(&backend),
            guard,
            Arc::clone(&clock) as Arc<dyn Clock>,
            FineRate::default(),
        ),
        backend,
        store,
        clock,
    }
}

fn book_x() -> BookDraft {
    BookDraft {
        title: "Book X".to_owned(),
        author: "A. Writer".to_owned(),
        isbn: "9780306406157".to_owned(),
        category: Some("Reference".to_owned()),
        publisher: None,
        publication_date: None,
        total_copies: 2,
        available_copies: None,
    }
}

fn member_y() -> MemberDraft {
    MemberDraft {
        first_name: "Member".to_owned(),
        last_name: "Y".to_owned(),
        email: "y@example.test".to_owned(),
        phone: "555-0199".to_owned(),
        date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2),
        address: Some("1 Library Lane".to_owned()),
        active: true,
    }
}

impl Library {
    async fn sign_up_and_in(&self, username: &str, role: Role) {
        let email = format!("{username}@example.test");
        let message = self
            .sessions
            .sign_up(username, &email, "password", role)
            .await
            .expect("signup");
        assert_eq!(message, "User registered successfully!");
        self.sessions
            .sign_in(username, "password")
            .await
            .expect("signin");
    }

    fn navigate(&self, view: View) -> Access {
        let session = self.store.get_session();
        AuthorizationGate::new(session.as_ref()).navigate(view)
    }
}

#[rstest]
#[tokio::test]
async fn member_is_turned_away_and_librarian_completes_a_loan(library: Library) {
    library.sign_up_and_in("reader", Role::Member).await;
    assert!(
        library
            .store
            .get_session()
            .is_some_and(|session| session.principal().has_role(Role::Member))
    );
    assert_eq!(library.navigate(View::Members), Access::RedirectToHome);

    library.sessions.sign_out().expect("sign out");
    assert_eq!(library.navigate(View::Members), Access::RedirectToLogin);

    library.sign_up_and_in("desk", Role::Librarian).await;
    assert_eq!(library.navigate(View::Members), Access::Allow);

    let book = library.books.create(&book_x()).await.expect("create book");
    let member = library.members.create(&member_y()).await.expect("create member");
    assert_eq!(book.copies().available(), 2);

    let loan = library.lending.borrow(book.id, member.id).await.expect("borrow");
    assert_eq!(loan.transaction.status, TransactionStatus::Borrowed);
    assert!(loan.transaction.due_date > loan.transaction.borrow_date);
    assert_eq!(
        library.books.find(book.id).await.expect("book").copies().available(),
        1
    );

    let returned = library
        .lending
        .return_loan(loan.transaction.id)
        .await
        .expect("return");
    assert_eq!(returned.transaction.status, TransactionStatus::Returned);
    assert!(returned.transaction.return_date.is_some());
    assert!(!returned.can_return());
    assert_eq!(
        library.books.find(book.id).await.expect("book").copies().available(),
        2
    );
}

#[rstest]
#[tokio::test]
async fn estimate_and_charged_fine_agree_for_a_late_return(library: Library) {
    library.sign_up_and_in("desk", Role::Librarian).await;
    let book = library.books.create(&book_x()).await.expect("create book");
    let member = library.members.create(&member_y()).await.expect("create member");
    let loan = library.lending.borrow(book.id, member.id).await.expect("borrow");

    library.clock.advance_days(18);
    let listed = library.lending.list_loans().await.expect("list");
    let outstanding = listed.first().expect("one loan");
    assert!(outstanding.overdue);
    assert_eq!(outstanding.days_overdue(), 4);
    assert_eq!(outstanding.fine.source, FineSource::Estimated);
    assert_eq!(outstanding.fine.amount.to_string(), "4.00");

    let report = library.lending.overdue_report().await.expect("report");
    assert_eq!(report.total, 1);

    let returned = library
        .lending
        .return_loan(loan.transaction.id)
        .await
        .expect("return");
    assert_eq!(returned.fine.source, FineSource::Backend);
    assert_eq!(returned.fine.amount, Money::from_cents(400));
    assert!(!returned.overdue);
}

#[rstest]
#[tokio::test]
async fn revoked_token_signs_the_desk_out(library: Library) {
    library.sign_up_and_in("desk", Role::Librarian).await;
    assert!(library.lending.list_loans().await.expect("list").is_empty());

    library.backend.expire_tokens();
    let err = library.lending.list_loans().await.expect_err("revoked");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert!(library.store.get_session().is_none());
    assert_eq!(library.navigate(View::Transactions), Access::RedirectToLogin);
}

#[rstest]
#[tokio::test]
async fn inactive_member_rejection_is_verbatim(library: Library) {
    library.sign_up_and_in("desk", Role::Librarian).await;
    let book = library.books.create(&book_x()).await.expect("create book");
    let mut draft = member_y();
    draft.active = false;
    let member = library.members.create(&draft).await.expect("create member");

    let err = library
        .lending
        .borrow(book.id, member.id)
        .await
        .expect_err("inactive");
    assert_eq!(err.code(), ErrorCode::Rejected);
    assert_eq!(err.message(), "Member is not active");
    assert_eq!(
        library.books.find(book.id).await.expect("book").copies().available(),
        2
    );
}
