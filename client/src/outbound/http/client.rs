//! Reqwest-backed library gateway.
//!
//! This adapter owns transport details only: endpoint construction, the
//! bearer header, HTTP status mapping, and JSON decoding into domain records.
//! Session clearing on authorization failures happens in the domain guard.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{
    BookDto, JwtResponseDto, MemberDto, MessageDto, OverdueReportDto, SigninRequestDto,
    SignupRequestDto, TransactionDto,
};
use crate::domain::ports::{
    AuthGateway, BookCatalogue, GatewayError, MemberDirectory, OverdueReport, OverdueSnapshot,
    SessionStore, TransactionLedger,
};
use crate::domain::{
    Book, BookDraft, BookId, LoginCredentials, Member, MemberDraft, MemberId, Session,
    SignupRequest, Transaction, TransactionId,
};

const USER_AGENT: &str = concat!("library-client/", env!("CARGO_PKG_VERSION"));

/// Library gateway that calls the REST API under one base URL.
pub struct HttpLibraryGateway<S> {
    client: Client,
    base: Url,
    sessions: S,
}

impl<S: SessionStore> HttpLibraryGateway<S> {
    /// Build a gateway with an explicit per-request timeout.
    ///
    /// The token for each call is read from `sessions` at send time.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration, sessions: S) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base,
            sessions,
        })
    }

    /// Base URL every path is resolved against.
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::transport(format!("base URL {} cannot hold paths", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, GatewayError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "library API call");
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        Ok(match self.sessions.get_session() {
            Some(session) => builder.bearer_auth(session.token().expose()),
            None => builder,
        })
    }

    fn anonymous(&self, segments: &[&str]) -> Result<RequestBuilder, GatewayError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "library API auth call");
        Ok(self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let body = send(builder).await?;
        serde_json::from_slice(&body)
            .map_err(|error| GatewayError::decode(format!("invalid JSON payload: {error}")))
    }

    async fn books(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Vec<Book>, GatewayError> {
        let mut builder = self.request(Method::GET, segments)?;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let dtos: Vec<BookDto> = self.fetch(builder).await?;
        Ok(keep_decodable(dtos, "book", BookDto::into_domain))
    }

    async fn book(&self, builder: RequestBuilder) -> Result<Book, GatewayError> {
        let dto: BookDto = self.fetch(builder).await?;
        dto.into_domain().map_err(GatewayError::decode)
    }

    async fn member(&self, builder: RequestBuilder) -> Result<Member, GatewayError> {
        let dto: MemberDto = self.fetch(builder).await?;
        dto.into_domain().map_err(GatewayError::decode)
    }

    async fn transactions(&self, segments: &[&str]) -> Result<Vec<Transaction>, GatewayError> {
        let dtos: Vec<TransactionDto> = self.fetch(self.request(Method::GET, segments)?).await?;
        Ok(dtos.into_iter().map(TransactionDto::into_domain).collect())
    }

    async fn transaction(&self, builder: RequestBuilder) -> Result<Transaction, GatewayError> {
        let dto: TransactionDto = self.fetch(builder).await?;
        Ok(dto.into_domain())
    }
}

/// Convert listed records, dropping the ones that cannot be represented.
fn keep_decodable<D, T>(
    dtos: Vec<D>,
    kind: &'static str,
    convert: impl Fn(D) -> Result<T, String>,
) -> Vec<T> {
    dtos.into_iter()
        .filter_map(|dto| match convert(dto) {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!(kind, %reason, "skipping undecodable record");
                None
            }
        })
        .collect()
}

async fn send(builder: RequestBuilder) -> Result<Vec<u8>, GatewayError> {
    let response = builder.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

#[async_trait]
impl<S: SessionStore> AuthGateway for HttpLibraryGateway<S> {
    async fn sign_up(&self, request: &SignupRequest) -> Result<String, GatewayError> {
        let builder = self
            .anonymous(&["auth", "signup"])?
            .json(&SignupRequestDto::from(request));
        let reply: MessageDto = self.fetch(builder).await?;
        Ok(reply.message)
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, GatewayError> {
        let builder = self
            .anonymous(&["auth", "signin"])?
            .json(&SigninRequestDto::from(credentials));
        let reply: JwtResponseDto = self.fetch(builder).await?;
        reply.into_session().map_err(GatewayError::decode)
    }
}

#[async_trait]
impl<S: SessionStore> BookCatalogue for HttpLibraryGateway<S> {
    async fn list_books(&self) -> Result<Vec<Book>, GatewayError> {
        self.books(&["books"], &[]).await
    }

    async fn search_books(&self, keyword: &str) -> Result<Vec<Book>, GatewayError> {
        self.books(&["books", "search"], &[("keyword", keyword)]).await
    }

    async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, GatewayError> {
        self.books(&["books", "category", category], &[]).await
    }

    async fn find_book(&self, id: BookId) -> Result<Book, GatewayError> {
        let id_segment = id.to_string();
        self.book(self.request(Method::GET, &["books", &id_segment])?).await
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Book, GatewayError> {
        let builder = self
            .request(Method::POST, &["books"])?
            .json(&BookDto::from(draft));
        self.book(builder).await
    }

    async fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book, GatewayError> {
        let id_segment = id.to_string();
        let builder = self
            .request(Method::PUT, &["books", &id_segment])?
            .json(&BookDto::from(draft));
        self.book(builder).await
    }

    async fn delete_book(&self, id: BookId) -> Result<(), GatewayError> {
        let id_segment = id.to_string();
        send(self.request(Method::DELETE, &["books", &id_segment])?).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> MemberDirectory for HttpLibraryGateway<S> {
    async fn list_members(&self) -> Result<Vec<Member>, GatewayError> {
        let dtos: Vec<MemberDto> = self.fetch(self.request(Method::GET, &["members"])?).await?;
        Ok(keep_decodable(dtos, "member", MemberDto::into_domain))
    }

    async fn find_member(&self, id: MemberId) -> Result<Member, GatewayError> {
        let id_segment = id.to_string();
        self.member(self.request(Method::GET, &["members", &id_segment])?).await
    }

    async fn create_member(&self, draft: &MemberDraft) -> Result<Member, GatewayError> {
        let builder = self
            .request(Method::POST, &["members"])?
            .json(&MemberDto::from(draft));
        self.member(builder).await
    }

    async fn update_member(
        &self,
        id: MemberId,
        draft: &MemberDraft,
    ) -> Result<Member, GatewayError> {
        let id_segment = id.to_string();
        let builder = self
            .request(Method::PUT, &["members", &id_segment])?
            .json(&MemberDto::from(draft));
        self.member(builder).await
    }

    async fn delete_member(&self, id: MemberId) -> Result<(), GatewayError> {
        let id_segment = id.to_string();
        send(self.request(Method::DELETE, &["members", &id_segment])?).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> TransactionLedger for HttpLibraryGateway<S> {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        self.transactions(&["transactions"]).await
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        let id_segment = id.to_string();
        self.transaction(self.request(Method::GET, &["transactions", &id_segment])?)
            .await
    }

    async fn transactions_for_member(
        &self,
        member: MemberId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let member_segment = member.to_string();
        self.transactions(&["transactions", "member", &member_segment]).await
    }

    async fn active_for_member(
        &self,
        member: MemberId,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let member_segment = member.to_string();
        self.transactions(&["transactions", "member", &member_segment, "active"])
            .await
    }

    async fn borrow(&self, book: BookId, member: MemberId) -> Result<Transaction, GatewayError> {
        let (book_param, member_param) = (book.to_string(), member.to_string());
        let builder = self
            .request(Method::POST, &["transactions", "borrow"])?
            .query(&[("bookId", book_param.as_str()), ("memberId", member_param.as_str())]);
        self.transaction(builder).await
    }

    async fn return_book(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        let id_segment = id.to_string();
        self.transaction(self.request(Method::POST, &["transactions", "return", &id_segment])?)
            .await
    }
}

#[async_trait]
impl<S: SessionStore> OverdueReport for HttpLibraryGateway<S> {
    async fn overdue_report(&self) -> Result<OverdueSnapshot, GatewayError> {
        let dto: OverdueReportDto = self
            .fetch(self.request(Method::GET, &["reports", "overdue"])?)
            .await?;
        Ok(dto.into_domain())
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::timeout(error.to_string())
    } else if error.is_decode() {
        GatewayError::decode(error.to_string())
    } else {
        GatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let reason = rejection_reason(body);
    let message = if reason.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), reason)
    };

    match status {
        StatusCode::UNAUTHORIZED => GatewayError::unauthorized(message),
        StatusCode::FORBIDDEN => GatewayError::forbidden(message),
        StatusCode::NOT_FOUND => GatewayError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::timeout(message),
        _ if status.is_client_error() => GatewayError::rejected(reason),
        _ => GatewayError::transport(message),
    }
}

/// Backend reason from a `{ "message": .. }` body, else a compact preview.
fn rejection_reason(body: &[u8]) -> String {
    match serde_json::from_slice::<MessageDto>(body) {
        Ok(MessageDto { message }) => message.trim().to_owned(),
        Err(_) => body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
