//! In-process library backend.
//!
//! Implements every gateway port against process memory with the rules the
//! REST service applies: copy accounting, the active-member check, the loan
//! period, the fine charged at return, and per-resource role checks. The
//! bearer token is read from the injected session store on every call, the
//! same way the HTTP adapter attaches it, so session handling behaves
//! identically over either adapter.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthGateway, BookCatalogue, GatewayError, MemberDirectory, OverdueReport, OverdueSnapshot,
    SessionStore, TransactionLedger,
};
use crate::domain::{
    AccessToken, Book, BookDraft, BookId, FineRate, Isbn, LifecycleError, LoanPolicy, LoginCredentials,
    Member, MemberDraft, MemberId, Principal, Role, RoleSet, Session, SignupRequest, Transaction,
    TransactionId, TransactionStatus, UserId,
};

const STAFF: &[Role] = &[Role::Admin, Role::Librarian];
const ANY_ROLE: &[Role] = &[Role::Admin, Role::Librarian, Role::Member];

struct Account {
    id: UserId,
    username: String,
    email: String,
    password: Zeroizing<String>,
    roles: RoleSet,
}

impl Account {
    fn principal(&self) -> Principal {
        Principal::new(
            self.id,
            self.username.clone(),
            Some(self.email.clone()),
            self.roles.clone(),
        )
    }
}

#[derive(Default)]
struct LibraryState {
    accounts: Vec<Account>,
    tokens: BTreeMap<String, UserId>,
    books: BTreeMap<BookId, Book>,
    members: BTreeMap<MemberId, Member>,
    transactions: BTreeMap<TransactionId, Transaction>,
    next_id: i64,
}

impl LibraryState {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn roles_for(&self, token: &str) -> Option<&RoleSet> {
        let user = self.tokens.get(token)?;
        self.accounts
            .iter()
            .find(|account| account.id == *user)
            .map(|account| &account.roles)
    }

    fn book(&self, id: BookId) -> Result<&Book, GatewayError> {
        self.books
            .get(&id)
            .ok_or_else(|| GatewayError::not_found(format!("Book not found with id: {id}")))
    }

    fn member(&self, id: MemberId) -> Result<&Member, GatewayError> {
        self.members
            .get(&id)
            .ok_or_else(|| GatewayError::not_found(format!("Member not found with id: {id}")))
    }

    fn isbn_taken(&self, isbn: &Isbn, except: Option<BookId>) -> bool {
        self.books
            .values()
            .any(|book| book.isbn == *isbn && Some(book.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<MemberId>) -> bool {
        self.members
            .values()
            .any(|member| member.email.eq_ignore_ascii_case(email) && Some(member.id) != except)
    }

    fn has_outstanding(&self, matches: impl Fn(&Transaction) -> bool) -> bool {
        self.transactions
            .values()
            .any(|transaction| transaction.is_outstanding() && matches(transaction))
    }

    fn collect(&self, keep: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.transactions
            .values()
            .filter(|transaction| keep(transaction))
            .cloned()
            .collect()
    }
}

/// Library backend held entirely in memory.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use library_client::domain::ports::MemorySessionStore;
/// use library_client::outbound::memory::InMemoryLibrary;
///
/// let store = Arc::new(MemorySessionStore::new());
/// let library = InMemoryLibrary::new(store, Arc::new(mockable::DefaultClock));
/// assert_eq!(library.book_count(), 0);
/// ```
pub struct InMemoryLibrary<S> {
    sessions: S,
    clock: Arc<dyn Clock>,
    policy: LoanPolicy,
    fine_rate: FineRate,
    state: Mutex<LibraryState>,
}

impl<S: SessionStore> InMemoryLibrary<S> {
    /// Empty library with the standard loan period and daily fine.
    pub fn new(sessions: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_rules(sessions, clock, LoanPolicy::default(), FineRate::default())
    }

    /// Empty library with explicit lending rules.
    pub fn with_rules(
        sessions: S,
        clock: Arc<dyn Clock>,
        policy: LoanPolicy,
        fine_rate: FineRate,
    ) -> Self {
        Self {
            sessions,
            clock,
            policy,
            fine_rate,
            state: Mutex::new(LibraryState::default()),
        }
    }

    /// Number of catalogued books.
    pub fn book_count(&self) -> usize {
        self.lock().books.len()
    }

    /// Revoke every issued token, as a server restart or key rotation would.
    pub fn expire_tokens(&self) {
        let mut state = self.lock();
        debug!(revoked = state.tokens.len(), "expiring issued tokens");
        state.tokens.clear();
    }

    fn lock(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Lock the state after checking the caller holds one of `roles`.
    fn authorized(&self, roles: &[Role]) -> Result<MutexGuard<'_, LibraryState>, GatewayError> {
        let session = self.sessions.get_session().ok_or_else(|| {
            GatewayError::unauthorized("Full authentication is required to access this resource")
        })?;
        let state = self.lock();
        let held = state
            .roles_for(session.token().expose())
            .ok_or_else(|| GatewayError::unauthorized("invalid or expired token"))?;
        if !held.contains_any(roles) {
            return Err(GatewayError::forbidden("Access Denied"));
        }
        Ok(state)
    }
}

#[async_trait]
impl<S: SessionStore> AuthGateway for InMemoryLibrary<S> {
    async fn sign_up(&self, request: &SignupRequest) -> Result<String, GatewayError> {
        let mut state = self.lock();
        if state
            .accounts
            .iter()
            .any(|account| account.username == request.username())
        {
            return Err(GatewayError::rejected("Error: Username is already taken!"));
        }
        if state
            .accounts
            .iter()
            .any(|account| account.email.eq_ignore_ascii_case(request.email()))
        {
            return Err(GatewayError::rejected("Error: Email is already in use!"));
        }
        let id = UserId::new(state.allocate());
        state.accounts.push(Account {
            id,
            username: request.username().to_owned(),
            email: request.email().to_owned(),
            password: Zeroizing::new(request.password().to_owned()),
            roles: [request.role()].into_iter().collect(),
        });
        debug!(user = %id, role = %request.role(), "account registered");
        Ok("User registered successfully!".to_owned())
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, GatewayError> {
        let mut state = self.lock();
        let principal = state
            .accounts
            .iter()
            .find(|account| {
                account.username == credentials.username()
                    && account.password.as_str() == credentials.password()
            })
            .map(Account::principal)
            .ok_or_else(|| GatewayError::unauthorized("Bad credentials"))?;
        let raw = Uuid::new_v4().simple().to_string();
        let token = AccessToken::new(raw.clone())
            .map_err(|error| GatewayError::decode(error.to_string()))?;
        state.tokens.insert(raw, principal.id());
        Ok(Session::new(token, principal))
    }
}

#[async_trait]
impl<S: SessionStore> BookCatalogue for InMemoryLibrary<S> {
    async fn list_books(&self) -> Result<Vec<Book>, GatewayError> {
        Ok(self.lock().books.values().cloned().collect())
    }

    async fn search_books(&self, keyword: &str) -> Result<Vec<Book>, GatewayError> {
        let needle = keyword.trim().to_lowercase();
        Ok(self
            .lock()
            .books
            .values()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
                    || book.isbn.as_str().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, GatewayError> {
        Ok(self
            .lock()
            .books
            .values()
            .filter(|book| book.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }

    async fn find_book(&self, id: BookId) -> Result<Book, GatewayError> {
        self.lock().book(id).cloned()
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Book, GatewayError> {
        let (isbn, copies) = draft
            .validate()
            .map_err(|error| GatewayError::rejected(error.to_string()))?;
        let mut state = self.lock();
        if state.isbn_taken(&isbn, None) {
            return Err(GatewayError::rejected(format!(
                "Error: ISBN {isbn} is already catalogued!"
            )));
        }
        let id = BookId::new(state.allocate());
        let book = Book::new(id, draft, isbn, copies);
        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book, GatewayError> {
        let (isbn, _) = draft
            .validate()
            .map_err(|error| GatewayError::rejected(error.to_string()))?;
        let mut state = self.lock();
        let current = state.book(id)?.copies();
        if state.isbn_taken(&isbn, Some(id)) {
            return Err(GatewayError::rejected(format!(
                "Error: ISBN {isbn} is already catalogued!"
            )));
        }
        let copies = current
            .with_total(draft.total_copies)
            .map_err(|error| GatewayError::rejected(error.to_string()))?;
        let book = Book::new(id, draft, isbn, copies);
        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn delete_book(&self, id: BookId) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.book(id)?;
        if state.has_outstanding(|transaction| transaction.book.id == id) {
            return Err(GatewayError::rejected(
                "Cannot delete a book with copies on loan",
            ));
        }
        state.books.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> MemberDirectory for InMemoryLibrary<S> {
    async fn list_members(&self) -> Result<Vec<Member>, GatewayError> {
        Ok(self.authorized(STAFF)?.members.values().cloned().collect())
    }

    async fn find_member(&self, id: MemberId) -> Result<Member, GatewayError> {
        self.authorized(STAFF)?.member(id).cloned()
    }

    async fn create_member(&self, draft: &MemberDraft) -> Result<Member, GatewayError> {
        let today = self.today();
        let mut state = self.authorized(STAFF)?;
        if state.email_taken(draft.email.trim(), None) {
            return Err(GatewayError::rejected("Error: Email is already in use!"));
        }
        let id = MemberId::new(state.allocate());
        let member = Member::from_draft(id, draft.clone(), today);
        state.members.insert(id, member.clone());
        Ok(member)
    }

    async fn update_member(
        &self,
        id: MemberId,
        draft: &MemberDraft,
    ) -> Result<Member, GatewayError> {
        let mut state = self.authorized(STAFF)?;
        let since = state.member(id)?.membership_start;
        if state.email_taken(draft.email.trim(), Some(id)) {
            return Err(GatewayError::rejected("Error: Email is already in use!"));
        }
        let mut member = Member::from_draft(id, draft.clone(), self.today());
        member.membership_start = since;
        state.members.insert(id, member.clone());
        Ok(member)
    }

    async fn delete_member(&self, id: MemberId) -> Result<(), GatewayError> {
        let mut state = self.authorized(STAFF)?;
        state.member(id)?;
        if state.has_outstanding(|transaction| transaction.member.id == id) {
            return Err(GatewayError::rejected(
                "Cannot delete a member with books on loan",
            ));
        }
        state.members.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> TransactionLedger for InMemoryLibrary<S> {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        Ok(self.authorized(ANY_ROLE)?.collect(|_| true))
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        self.authorized(ANY_ROLE)?
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("Transaction not found with id: {id}")))
    }

    async fn transactions_for_member(
        &self,
        member: MemberId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        Ok(self
            .authorized(ANY_ROLE)?
            .collect(|transaction| transaction.member.id == member))
    }

    async fn active_for_member(
        &self,
        member: MemberId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        Ok(self.authorized(ANY_ROLE)?.collect(|transaction| {
            transaction.member.id == member && transaction.status == TransactionStatus::Borrowed
        }))
    }

    async fn borrow(&self, book: BookId, member: MemberId) -> Result<Transaction, GatewayError> {
        let today = self.today();
        let mut state = self.authorized(ANY_ROLE)?;
        state
            .book(book)
            .map_err(|_| GatewayError::rejected(format!("Book not found with id: {book}")))?;
        let borrower = state
            .member(member)
            .map_err(|_| GatewayError::rejected(format!("Member not found with id: {member}")))?
            .clone();
        let id = TransactionId::new(state.allocate());
        let shelf = state
            .books
            .get_mut(&book)
            .ok_or_else(|| GatewayError::rejected(format!("Book not found with id: {book}")))?;
        let transaction = Transaction::open(id, shelf, &borrower, today, self.policy)
            .map_err(lifecycle_rejection)?;
        state.transactions.insert(id, transaction.clone());
        debug!(transaction = %id, %book, %member, "loan opened");
        Ok(transaction)
    }

    async fn return_book(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        let today = self.today();
        let mut guard = self.authorized(ANY_ROLE)?;
        let state = &mut *guard;
        let transaction = state.transactions.get_mut(&id).ok_or_else(|| {
            GatewayError::rejected(format!("Transaction not found with id: {id}"))
        })?;
        let book_id = transaction.book.id;
        let shelf = state
            .books
            .get_mut(&book_id)
            .ok_or_else(|| GatewayError::rejected(format!("Book not found with id: {book_id}")))?;
        transaction
            .close(shelf, today, self.fine_rate)
            .map_err(lifecycle_rejection)?;
        debug!(transaction = %id, fine = ?transaction.fine_amount, "loan closed");
        Ok(transaction.clone())
    }
}

#[async_trait]
impl<S: SessionStore> OverdueReport for InMemoryLibrary<S> {
    async fn overdue_report(&self) -> Result<OverdueSnapshot, GatewayError> {
        let today = self.today();
        let transactions = self.authorized(STAFF)?.collect(|transaction| {
            transaction.status == TransactionStatus::Borrowed && transaction.due_date < today
        });
        Ok(OverdueSnapshot {
            total: transactions.len(),
            transactions,
        })
    }
}

fn lifecycle_rejection(error: LifecycleError) -> GatewayError {
    GatewayError::rejected(error.to_string())
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
