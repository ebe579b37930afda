//! Wire DTOs for the library REST API.
//!
//! Responses decode into these transport shapes first and are converted into
//! domain records in one pass; conversion failures surface as decode errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccessToken, Book, BookDraft, BookId, BookSummary, CopyCount, Isbn, LoginCredentials, Member,
    MemberDraft, MemberId, MemberSummary, Money, Principal, RoleSet, Session, SignupRequest,
    Transaction, TransactionId, TransactionStatus, UserId,
};
use crate::domain::ports::OverdueSnapshot;

#[derive(Debug, Serialize)]
pub(super) struct SigninRequestDto<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

impl<'a> From<&'a LoginCredentials> for SigninRequestDto<'a> {
    fn from(value: &'a LoginCredentials) -> Self {
        Self {
            username: value.username(),
            password: value.password(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SignupRequestDto<'a> {
    pub(super) username: &'a str,
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) role: [&'static str; 1],
}

impl<'a> From<&'a SignupRequest> for SignupRequestDto<'a> {
    fn from(value: &'a SignupRequest) -> Self {
        Self {
            username: value.username(),
            email: value.email(),
            password: value.password(),
            role: [value.role().signup_name()],
        }
    }
}

/// `{ "message": ".." }` bodies used for confirmations and rejections.
#[derive(Debug, Deserialize)]
pub(super) struct MessageDto {
    #[serde(default)]
    pub(super) message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct JwtResponseDto {
    token: String,
    id: i64,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl JwtResponseDto {
    pub(super) fn into_session(self) -> Result<Session, String> {
        let token = AccessToken::new(self.token).map_err(|error| error.to_string())?;
        let principal = Principal::new(
            UserId::new(self.id),
            self.username,
            self.email,
            RoleSet::from_names(self.roles),
        );
        Ok(Session::new(token, principal))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BookDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) id: Option<i64>,
    pub(super) title: String,
    pub(super) author: String,
    pub(super) isbn: String,
    #[serde(default)]
    pub(super) category: Option<String>,
    #[serde(default)]
    pub(super) publisher: Option<String>,
    #[serde(default)]
    pub(super) publication_date: Option<NaiveDate>,
    pub(super) total_copies: u32,
    pub(super) available_copies: u32,
}

impl From<&BookDraft> for BookDto {
    fn from(draft: &BookDraft) -> Self {
        Self {
            id: None,
            title: draft.title.trim().to_owned(),
            author: draft.author.trim().to_owned(),
            isbn: draft.isbn.trim().to_owned(),
            category: draft.category.clone(),
            publisher: draft.publisher.clone(),
            publication_date: draft.publication_date,
            total_copies: draft.total_copies,
            available_copies: draft.available_copies.unwrap_or(draft.total_copies),
        }
    }
}

impl BookDto {
    /// Server books skip form validation: the ISBN is kept as recorded and
    /// only the copy-count bounds are enforced.
    pub(super) fn into_domain(self) -> Result<Book, String> {
        let id = self
            .id
            .ok_or_else(|| format!("book {:?} has no id", self.title))?;
        let isbn = Isbn::from_record(&self.isbn);
        let copies = CopyCount::new(self.total_copies, self.available_copies)
            .map_err(|error| format!("book {id}: {error}"))?;
        let draft = BookDraft {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            publisher: self.publisher,
            publication_date: self.publication_date,
            total_copies: self.total_copies,
            available_copies: Some(self.available_copies),
        };
        Ok(Book::new(BookId::new(id), &draft, isbn, copies))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MemberDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) id: Option<i64>,
    pub(super) first_name: String,
    pub(super) last_name: String,
    pub(super) email: String,
    #[serde(default)]
    pub(super) phone_number: String,
    #[serde(default)]
    pub(super) date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub(super) address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) membership_start_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub(super) is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl From<&MemberDraft> for MemberDto {
    fn from(draft: &MemberDraft) -> Self {
        Self {
            id: None,
            first_name: draft.first_name.trim().to_owned(),
            last_name: draft.last_name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            phone_number: draft.phone.trim().to_owned(),
            date_of_birth: draft.date_of_birth,
            address: draft.address.clone(),
            membership_start_date: None,
            is_active: draft.active,
        }
    }
}

impl MemberDto {
    pub(super) fn into_domain(self) -> Result<Member, String> {
        let id = self
            .id
            .ok_or_else(|| format!("member {:?} has no id", self.email))?;
        Ok(Member {
            id: MemberId::new(id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone_number,
            date_of_birth: self.date_of_birth,
            address: self.address,
            membership_start: self.membership_start_date,
            active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BookRefDto {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MemberRefDto {
    id: i64,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransactionDto {
    id: i64,
    book: BookRefDto,
    member: MemberRefDto,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    #[serde(default)]
    return_date: Option<NaiveDate>,
    status: TransactionStatus,
    #[serde(default)]
    fine_amount: Option<f64>,
}

impl TransactionDto {
    pub(super) fn into_domain(self) -> Transaction {
        Transaction {
            id: TransactionId::new(self.id),
            book: BookSummary {
                id: BookId::new(self.book.id),
                title: self.book.title,
                author: self.book.author,
            },
            member: MemberSummary {
                id: MemberId::new(self.member.id),
                first_name: self.member.first_name,
                last_name: self.member.last_name,
            },
            borrow_date: self.borrow_date,
            due_date: self.due_date,
            return_date: self.return_date,
            status: self.status,
            fine_amount: self.fine_amount.map(Money::from_decimal),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OverdueReportDto {
    #[serde(default)]
    total_overdue: Option<usize>,
    #[serde(default)]
    overdue_books: Vec<TransactionDto>,
}

impl OverdueReportDto {
    pub(super) fn into_domain(self) -> OverdueSnapshot {
        let transactions: Vec<Transaction> = self
            .overdue_books
            .into_iter()
            .map(TransactionDto::into_domain)
            .collect();
        OverdueSnapshot {
            total: self.total_overdue.unwrap_or(transactions.len()),
            transactions,
        }
    }
}
