//! Book and member administration.
//!
//! Reads are open to every caller the backend admits and degrade to empty
//! lists on failure. Writes are checked against the gate first, validated
//! locally, then sent; their failures always propagate.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::ports::{BookCatalogue, MemberDirectory, SessionStore};
use crate::domain::{
    Book, BookDraft, BookId, DomainError, Member, MemberDraft, MemberId, SessionGuard,
};

fn invalid_field(field: &str, message: impl Into<String>) -> DomainError {
    DomainError::invalid_request(message).with_details(json!({ "field": field }))
}

/// Catalogue use-cases.
pub struct BookCatalogueService<C, S> {
    catalogue: Arc<C>,
    guard: SessionGuard<S>,
}

impl<C, S> BookCatalogueService<C, S>
where
    C: BookCatalogue,
    S: SessionStore,
{
    /// Service over a catalogue gateway.
    pub const fn new(catalogue: Arc<C>, guard: SessionGuard<S>) -> Self {
        Self { catalogue, guard }
    }

    /// Every book.
    pub async fn list(&self) -> Result<Vec<Book>, DomainError> {
        self.guard
            .admit_read(self.catalogue.list_books().await, "books")
    }

    /// Keyword search; a blank keyword lists everything.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Book>, DomainError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list().await;
        }
        self.guard
            .admit_read(self.catalogue.search_books(keyword).await, "book search")
    }

    /// Books in one category; a blank category lists everything.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Book>, DomainError> {
        let category = category.trim();
        if category.is_empty() {
            return self.list().await;
        }
        self.guard.admit_read(
            self.catalogue.books_by_category(category).await,
            "book category",
        )
    }

    /// Books with at least one copy on the shelf.
    pub async fn lendable(&self) -> Result<Vec<Book>, DomainError> {
        let mut books = self.list().await?;
        books.retain(|book| book.copies().can_lend());
        Ok(books)
    }

    /// One book.
    pub async fn find(&self, id: BookId) -> Result<Book, DomainError> {
        self.guard.admit(self.catalogue.find_book(id).await)
    }

    /// Add a book. Every copy starts on the shelf unless the draft says
    /// otherwise.
    pub async fn create(&self, draft: &BookDraft) -> Result<Book, DomainError> {
        self.guard
            .require(|gate| gate.can_manage_catalogue(), "add books")?;
        validate_book(draft)?;
        let book = self.guard.admit(self.catalogue.create_book(draft).await)?;
        info!(book = %book.id, isbn = %book.isbn, "book added");
        Ok(book)
    }

    /// Replace a book's details.
    ///
    /// Without an explicit shelf count the current book is read first and
    /// the copies on loan stay on loan under the new total.
    pub async fn update(&self, id: BookId, draft: &BookDraft) -> Result<Book, DomainError> {
        self.guard
            .require(|gate| gate.can_manage_catalogue(), "edit books")?;
        validate_book(draft)?;
        let mut sent = draft.clone();
        if sent.available_copies.is_none() {
            let current = self.find(id).await?;
            let copies = current
                .copies()
                .with_total(draft.total_copies)
                .map_err(|error| invalid_field("totalCopies", error.to_string()))?;
            sent.available_copies = Some(copies.available());
        }
        let book = self
            .guard
            .admit(self.catalogue.update_book(id, &sent).await)?;
        info!(book = %id, "book updated");
        Ok(book)
    }

    /// Remove a book.
    pub async fn delete(&self, id: BookId) -> Result<(), DomainError> {
        self.guard
            .require(|gate| gate.can_manage_catalogue(), "delete books")?;
        self.guard.admit(self.catalogue.delete_book(id).await)?;
        info!(book = %id, "book deleted");
        Ok(())
    }
}

fn validate_book(draft: &BookDraft) -> Result<(), DomainError> {
    draft
        .validate()
        .map(|_| ())
        .map_err(|error| invalid_field(error.field(), error.to_string()))
}

/// Member administration use-cases.
pub struct MemberDirectoryService<M, S> {
    directory: Arc<M>,
    guard: SessionGuard<S>,
}

impl<M, S> MemberDirectoryService<M, S>
where
    M: MemberDirectory,
    S: SessionStore,
{
    /// Service over a member directory gateway.
    pub const fn new(directory: Arc<M>, guard: SessionGuard<S>) -> Self {
        Self { directory, guard }
    }

    /// Every member.
    pub async fn list(&self) -> Result<Vec<Member>, DomainError> {
        self.guard
            .admit_read(self.directory.list_members().await, "members")
    }

    /// Members eligible to borrow.
    pub async fn active(&self) -> Result<Vec<Member>, DomainError> {
        let mut members = self.list().await?;
        members.retain(|member| member.active);
        Ok(members)
    }

    /// One member.
    pub async fn find(&self, id: MemberId) -> Result<Member, DomainError> {
        self.guard.admit(self.directory.find_member(id).await)
    }

    /// Register a member.
    pub async fn create(&self, draft: &MemberDraft) -> Result<Member, DomainError> {
        self.guard
            .require(|gate| gate.can_manage_members(), "add members")?;
        validate_member(draft)?;
        let member = self.guard.admit(self.directory.create_member(draft).await)?;
        info!(member = %member.id, "member added");
        Ok(member)
    }

    /// Replace a member's details.
    pub async fn update(&self, id: MemberId, draft: &MemberDraft) -> Result<Member, DomainError> {
        self.guard
            .require(|gate| gate.can_manage_members(), "edit members")?;
        validate_member(draft)?;
        let member = self
            .guard
            .admit(self.directory.update_member(id, draft).await)?;
        info!(member = %id, active = member.active, "member updated");
        Ok(member)
    }

    /// Remove a member.
    pub async fn delete(&self, id: MemberId) -> Result<(), DomainError> {
        self.guard
            .require(|gate| gate.can_manage_members(), "delete members")?;
        self.guard.admit(self.directory.delete_member(id).await)?;
        info!(member = %id, "member deleted");
        Ok(())
    }
}

fn validate_member(draft: &MemberDraft) -> Result<(), DomainError> {
    draft
        .validate()
        .map_err(|error| invalid_field(error.field(), error.to_string()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{GatewayError, MemorySessionStore, MockBookCatalogue, MockMemberDirectory};
    use crate::domain::{AccessToken, ErrorCode, Principal, Role, RoleSet, Session, UserId};
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    fn guard(role: Option<Role>) -> SessionGuard<MemorySessionStore> {
        let store = match role {
            Some(role) => MemorySessionStore::with_session(Session::new(
                AccessToken::new("tok").expect("token"),
                Principal::new(UserId::new(1), "u", None, [role].into_iter().collect::<RoleSet>()),
            )),
            None => MemorySessionStore::new(),
        };
        SessionGuard::new(Arc::new(store))
    }

    #[fixture]
    fn draft() -> BookDraft {
        BookDraft {
            title: "Refactoring".to_owned(),
            author: "Martin Fowler".to_owned(),
            isbn: "978-0134757599".to_owned(),
            category: Some("Software".to_owned()),
            publisher: None,
            publication_date: None,
            total_copies: 3,
            available_copies: None,
        }
    }

    fn book_from(draft: &BookDraft, id: i64) -> Book {
        let (isbn, copies) = draft.validate().expect("valid");
        Book::new(BookId::new(id), draft, isbn, copies)
    }

    #[rstest]
    #[tokio::test]
    async fn blank_search_lists_everything(draft: BookDraft) {
        let listed = book_from(&draft, 1);
        let mut catalogue = MockBookCatalogue::new();
        catalogue.expect_search_books().times(0);
        catalogue
            .expect_list_books()
            .times(1)
            .returning(move || Ok(vec![listed.clone()]));
        let service = BookCatalogueService::new(Arc::new(catalogue), guard(None));

        let books = service.search("   ").await.expect("list");
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn list_failure_degrades_to_empty() {
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_list_books()
            .returning(|| Err(GatewayError::transport("connection refused")));
        let service = BookCatalogueService::new(Arc::new(catalogue), guard(None));

        assert_eq!(service.list().await.expect("degraded"), Vec::<Book>::new());
    }

    #[rstest]
    #[tokio::test]
    async fn member_cannot_add_books(draft: BookDraft) {
        let mut catalogue = MockBookCatalogue::new();
        catalogue.expect_create_book().times(0);
        let service = BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Member)));

        let err = service.create(&draft).await.expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_isbn_is_reported_by_field(mut draft: BookDraft) {
        draft.isbn = "12".to_owned();
        let mut catalogue = MockBookCatalogue::new();
        catalogue.expect_create_book().times(0);
        let service =
            BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Librarian)));

        let err = service.create(&draft).await.expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details(), Some(&json!({ "field": "isbn" })));
    }

    #[rstest]
    #[tokio::test]
    async fn admin_adds_book(draft: BookDraft) {
        let created = book_from(&draft, 9);
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_create_book()
            .withf(|sent| sent.available_copies.is_none())
            .times(1)
            .returning(move |_| Ok(created.clone()));
        let service = BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Admin)));

        let book = service.create(&draft).await.expect("created");
        assert_eq!(book.copies().available(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn edit_keeps_copies_on_loan_off_the_shelf(mut draft: BookDraft) {
        draft.available_copies = Some(1);
        let current = book_from(&draft, 4);
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_find_book()
            .times(1)
            .returning(move |_| Ok(current.clone()));
        catalogue
            .expect_update_book()
            .withf(|_, sent| sent.total_copies == 5 && sent.available_copies == Some(3))
            .times(1)
            .returning(|id, sent| {
                let (isbn, copies) = sent.validate().expect("valid");
                Ok(Book::new(id, sent, isbn, copies))
            });
        let service =
            BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Librarian)));

        let mut edit = draft;
        edit.total_copies = 5;
        edit.available_copies = None;
        let book = service.update(BookId::new(4), &edit).await.expect("updated");
        assert_eq!(book.copies().on_loan(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn edit_below_copies_on_loan_is_refused(mut draft: BookDraft) {
        draft.available_copies = Some(0);
        let current = book_from(&draft, 4);
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_find_book()
            .returning(move |_| Ok(current.clone()));
        catalogue.expect_update_book().times(0);
        let service =
            BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Librarian)));

        let mut edit = draft;
        edit.total_copies = 2;
        edit.available_copies = None;
        let err = service.update(BookId::new(4), &edit).await.expect_err("refused");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details(), Some(&json!({ "field": "totalCopies" })));
    }

    #[rstest]
    #[tokio::test]
    async fn lendable_hides_empty_shelves(draft: BookDraft) {
        let on_shelf = book_from(&draft, 1);
        let mut empty_draft = draft;
        empty_draft.available_copies = Some(0);
        let empty = book_from(&empty_draft, 2);
        let mut catalogue = MockBookCatalogue::new();
        catalogue
            .expect_list_books()
            .returning(move || Ok(vec![on_shelf.clone(), empty.clone()]));
        let service = BookCatalogueService::new(Arc::new(catalogue), guard(Some(Role::Librarian)));

        let books = service.lendable().await.expect("list");
        assert_eq!(books.iter().map(|book| book.id).collect::<Vec<_>>(), vec![BookId::new(1)]);
    }

    fn member(id: i64, active: bool) -> Member {
        Member::from_draft(
            MemberId::new(id),
            MemberDraft {
                first_name: "A".to_owned(),
                last_name: "B".to_owned(),
                email: format!("m{id}@example.test"),
                phone: "555".to_owned(),
                date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
                address: None,
                active,
            },
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        )
    }

    #[tokio::test]
    async fn active_filters_inactive_members() {
        let mut directory = MockMemberDirectory::new();
        directory
            .expect_list_members()
            .returning(|| Ok(vec![member(1, true), member(2, false)]));
        let service =
            MemberDirectoryService::new(Arc::new(directory), guard(Some(Role::Librarian)));

        let active = service.active().await.expect("list");
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|m| m.id), Some(MemberId::new(1)));
    }

    #[tokio::test]
    async fn signed_out_member_write_needs_sign_in() {
        let mut directory = MockMemberDirectory::new();
        directory.expect_delete_member().times(0);
        let service = MemberDirectoryService::new(Arc::new(directory), guard(None));

        let err = service.delete(MemberId::new(1)).await.expect_err("signed out");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn duplicate_email_reason_is_verbatim() {
        let mut directory = MockMemberDirectory::new();
        directory
            .expect_create_member()
            .returning(|_| Err(GatewayError::rejected("Error: Email is already in use!")));
        let service =
            MemberDirectoryService::new(Arc::new(directory), guard(Some(Role::Librarian)));
        let draft = MemberDraft {
            first_name: "A".to_owned(),
            last_name: "B".to_owned(),
            email: "a@example.test".to_owned(),
            phone: "555".to_owned(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
            address: None,
            active: true,
        };

        let err = service.create(&draft).await.expect_err("duplicate");
        assert_eq!(err.message(), "Error: Email is already in use!");
    }
}
