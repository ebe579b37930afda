//! Command dispatcher wiring the CLI grammar to the domain services.

use std::io::{self, Write};
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;

use super::command::{BookCommand, Command, LoanCommand, MemberCommand, ReportCommand};
use super::render;
use crate::domain::ports::{LibraryBackend, SessionStore};
use crate::domain::{
    Access, AccessPolicy, AuthorizationGate, BookCatalogueService, BookDraft, DomainError,
    ErrorCode, FineRate, LendingBoard, LendingService, MemberDirectoryService, MemberDraft,
    Session, SessionGuard, SessionService,
};

const SIGN_IN_REQUIRED: &str = "sign in required: run `library-client signin` first";

/// Failures while running one command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The operation failed.
    #[error("{0}")]
    Domain(#[from] DomainError),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran.
    Completed,
    /// The gate turned the caller away.
    Redirected(Access),
}

impl Outcome {
    /// Process exit status: 0 when completed, 2 when redirected.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Redirected(_) => 2,
        }
    }
}

/// Front desk running CLI commands against one backend and session store.
pub struct Desk<B, S> {
    store: Arc<S>,
    sessions: SessionService<B, S>,
    books: BookCatalogueService<B, S>,
    members: MemberDirectoryService<B, S>,
    board: LendingBoard<B, B, B, B, S>,
}

impl<B, S> Desk<B, S>
where
    B: LibraryBackend,
    S: SessionStore,
{
    /// Wire every service to `backend` and `store`.
    pub fn new(backend: Arc<B>, store: Arc<S>, clock: Arc<dyn Clock>, fine_rate: FineRate) -> Self {
        let guard = SessionGuard::new(Arc::clone(&store));
        let lending = LendingService::new(
            Arc::clone(&backend),
            Arc::clone(&backend),
            guard.clone(),
            clock,
            fine_rate,
        );
        let board = LendingBoard::new(
            lending,
            BookCatalogueService::new(Arc::clone(&backend), guard.clone()),
            MemberDirectoryService::new(Arc::clone(&backend), guard.clone()),
        );
        Self {
            sessions: SessionService::new(Arc::clone(&backend), Arc::clone(&store)),
            books: BookCatalogueService::new(Arc::clone(&backend), guard.clone()),
            members: MemberDirectoryService::new(backend, guard),
            board,
            store,
        }
    }

    /// Run `command`, writing results to `out`.
    ///
    /// The command's view is entered through the authorization gate first; a
    /// redirect is reported and nothing else runs. A session the backend
    /// stops honouring mid-command is reported as the same sign-in redirect.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Domain`] when the operation fails and
    /// [`CliError::Output`] when `out` cannot be written.
    pub async fn run(&self, command: Command, out: &mut impl Write) -> Result<Outcome, CliError> {
        let session = self.store.get_session();
        let gate = AuthorizationGate::new(session.as_ref());
        let access = gate.navigate(command.view());
        match access {
            Access::Allow => {}
            Access::RedirectToLogin => {
                writeln!(out, "{SIGN_IN_REQUIRED}")?;
                return Ok(Outcome::Redirected(access));
            }
            Access::RedirectToHome => {
                let username = gate
                    .session()
                    .map_or("caller", |current| current.principal().username());
                if command.view().policy() == AccessPolicy::GuestOnly {
                    writeln!(out, "not permitted: already signed in as {username}; sign out first")?;
                } else {
                    writeln!(out, "not permitted: {username} cannot open {}", command.view())?;
                }
                return Ok(Outcome::Redirected(access));
            }
        }

        match self.dispatch(command, session.as_ref(), out).await {
            Ok(()) => Ok(Outcome::Completed),
            Err(CliError::Domain(error))
                if session.is_some() && error.code() == ErrorCode::Unauthorized =>
            {
                writeln!(out, "{SIGN_IN_REQUIRED}")?;
                Ok(Outcome::Redirected(Access::RedirectToLogin))
            }
            Err(error) => Err(error),
        }
    }

    async fn dispatch(
        &self,
        command: Command,
        session: Option<&Session>,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        match command {
            Command::Signup {
                username,
                email,
                password,
                role,
            } => {
                let message = self
                    .sessions
                    .sign_up(&username, &email, &password, role)
                    .await?;
                writeln!(out, "{message}")?;
            }
            Command::Signin { username, password } => {
                let signed_in = self.sessions.sign_in(&username, &password).await?;
                let menu = AuthorizationGate::new(Some(&signed_in)).menu();
                render::session(out, &signed_in, &menu)?;
            }
            Command::Signout => {
                self.sessions.sign_out()?;
                writeln!(out, "signed out")?;
            }
            Command::Whoami => match session {
                Some(current) => {
                    let menu = AuthorizationGate::new(Some(current)).menu();
                    render::session(out, current, &menu)?;
                }
                None => writeln!(out, "not signed in")?,
            },
            Command::Books { action } => self.books(action, out).await?,
            Command::Members { action } => self.members(action, out).await?,
            Command::Loans { action } => self.loans(action, out).await?,
            Command::MyBooks => render::loans(out, &self.board.lending().my_loans().await?)?,
            Command::Reports {
                action: ReportCommand::Overdue,
            } => render::report(out, &self.board.lending().overdue_report().await?)?,
        }
        Ok(())
    }

    async fn books(&self, action: BookCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            BookCommand::List => render::books(out, &self.books.list().await?)?,
            BookCommand::Search { keyword } => {
                render::books(out, &self.books.search(&keyword).await?)?;
            }
            BookCommand::Category { category } => {
                render::books(out, &self.books.by_category(&category).await?)?;
            }
            BookCommand::Show { id } => render::book(out, &self.books.find(id).await?)?,
            BookCommand::Add(args) => {
                let created = self.books.create(&BookDraft::from(args)).await?;
                render::book(out, &created)?;
            }
            BookCommand::Update { id, book } => {
                let updated = self.books.update(id, &BookDraft::from(book)).await?;
                render::book(out, &updated)?;
            }
            BookCommand::Delete { id } => {
                self.books.delete(id).await?;
                writeln!(out, "deleted book #{id}")?;
            }
        }
        Ok(())
    }

    async fn members(&self, action: MemberCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            MemberCommand::List => render::members(out, &self.members.list().await?)?,
            MemberCommand::Show { id } => render::member(out, &self.members.find(id).await?)?,
            MemberCommand::Add(args) => {
                let created = self.members.create(&MemberDraft::from(args)).await?;
                render::member(out, &created)?;
            }
            MemberCommand::Update { id, member } => {
                let updated = self.members.update(id, &MemberDraft::from(member)).await?;
                render::member(out, &updated)?;
            }
            MemberCommand::Delete { id } => {
                self.members.delete(id).await?;
                writeln!(out, "deleted member #{id}")?;
            }
        }
        Ok(())
    }

    async fn loans(&self, action: LoanCommand, out: &mut impl Write) -> Result<(), CliError> {
        let lending = self.board.lending();
        match action {
            LoanCommand::List => render::loans(out, &lending.list_loans().await?)?,
            LoanCommand::Board => {
                self.board.refresh().await?;
                render::board(out, &self.board.snapshot())?;
            }
            LoanCommand::Show { id } => render::loan(out, &lending.find_loan(id).await?)?,
            LoanCommand::Member { id, active } => {
                render::loans(out, &lending.loans_for_member(id, active).await?)?;
            }
            LoanCommand::Borrow { book, member } => {
                render::loan(out, &self.board.borrow(book, member).await?)?;
            }
            LoanCommand::Return { id } => {
                render::loan(out, &self.board.return_loan(id).await?)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "desk_tests.rs"]
mod tests;
