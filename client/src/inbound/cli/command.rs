//! Command-line grammar.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{BookDraft, BookId, MemberDraft, MemberId, Role, TransactionId, View};

/// `library-client` arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "library-client",
    about = "Administer a library catalogue: books, members, loans, and overdue fines",
    version
)]
pub struct Cli {
    /// Base URL of the library API. Overrides `LIBRARY_CLIENT_API_URL`.
    #[arg(long, value_name = "url", global = true)]
    pub api_url: Option<String>,
    /// Session file path. Overrides `LIBRARY_CLIENT_SESSION_FILE`.
    #[arg(long, value_name = "path", global = true)]
    pub session_file: Option<PathBuf>,
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register an account.
    Signup {
        /// Account name.
        #[arg(long)]
        username: String,
        /// Contact email.
        #[arg(long)]
        email: String,
        /// Password.
        #[arg(long)]
        password: String,
        /// Requested role: member, librarian, or admin.
        #[arg(long, default_value = "member")]
        role: Role,
    },
    /// Sign in and keep the session.
    Signin {
        /// Account name.
        #[arg(long)]
        username: String,
        /// Password.
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Signout,
    /// Show who is signed in.
    Whoami,
    /// Browse and edit the catalogue.
    Books {
        /// Catalogue operation.
        #[command(subcommand)]
        action: BookCommand,
    },
    /// Browse and edit library members.
    Members {
        /// Directory operation.
        #[command(subcommand)]
        action: MemberCommand,
    },
    /// Borrow, return, and list loans.
    Loans {
        /// Lending operation.
        #[command(subcommand)]
        action: LoanCommand,
    },
    /// Outstanding loans of the signed-in member.
    MyBooks,
    /// Library reports.
    Reports {
        /// Report to show.
        #[command(subcommand)]
        action: ReportCommand,
    },
}

impl Command {
    /// View this command enters, for the authorization gate.
    pub const fn view(&self) -> View {
        match self {
            Self::Signup { .. } => View::Signup,
            Self::Signin { .. } => View::Login,
            Self::Signout | Self::Whoami => View::Home,
            Self::Books { .. } => View::Books,
            Self::Members { .. } => View::Members,
            Self::Loans { .. } => View::Transactions,
            Self::MyBooks => View::MyBooks,
            Self::Reports { .. } => View::Reports,
        }
    }
}

/// Catalogue operations.
#[derive(Debug, Clone, Subcommand)]
pub enum BookCommand {
    /// Every book.
    List,
    /// Books whose title, author, or ISBN match.
    Search {
        /// Search keyword.
        keyword: String,
    },
    /// Books in one category.
    Category {
        /// Category name.
        category: String,
    },
    /// One book.
    Show {
        /// Book identifier.
        id: BookId,
    },
    /// Add a book.
    Add(BookArgs),
    /// Replace a book's details.
    Update {
        /// Book identifier.
        id: BookId,
        /// New details.
        #[command(flatten)]
        book: BookArgs,
    },
    /// Remove a book.
    Delete {
        /// Book identifier.
        id: BookId,
    },
}

/// Book form fields.
#[derive(Debug, Clone, Args)]
pub struct BookArgs {
    /// Title.
    #[arg(long)]
    pub title: String,
    /// Author.
    #[arg(long)]
    pub author: String,
    /// ISBN-10 or ISBN-13; hyphens allowed.
    #[arg(long)]
    pub isbn: String,
    /// Shelf category.
    #[arg(long)]
    pub category: Option<String>,
    /// Publisher.
    #[arg(long)]
    pub publisher: Option<String>,
    /// Publication date (YYYY-MM-DD).
    #[arg(long, value_name = "date")]
    pub published: Option<NaiveDate>,
    /// Copies owned.
    #[arg(long, default_value_t = 1)]
    pub total_copies: u32,
    /// Copies on the shelf; defaults to every copy.
    #[arg(long)]
    pub available_copies: Option<u32>,
}

impl From<BookArgs> for BookDraft {
    fn from(args: BookArgs) -> Self {
        Self {
            title: args.title,
            author: args.author,
            isbn: args.isbn,
            category: args.category,
            publisher: args.publisher,
            publication_date: args.published,
            total_copies: args.total_copies,
            available_copies: args.available_copies,
        }
    }
}

/// Member directory operations.
#[derive(Debug, Clone, Subcommand)]
pub enum MemberCommand {
    /// Every member.
    List,
    /// One member.
    Show {
        /// Member identifier.
        id: MemberId,
    },
    /// Enrol a member.
    Add(MemberArgs),
    /// Replace a member's details.
    Update {
        /// Member identifier.
        id: MemberId,
        /// New details.
        #[command(flatten)]
        member: MemberArgs,
    },
    /// Remove a member.
    Delete {
        /// Member identifier.
        id: MemberId,
    },
}

/// Member form fields.
#[derive(Debug, Clone, Args)]
pub struct MemberArgs {
    /// Given name.
    #[arg(long)]
    pub first_name: String,
    /// Family name.
    #[arg(long)]
    pub last_name: String,
    /// Contact email.
    #[arg(long)]
    pub email: String,
    /// Contact phone number.
    #[arg(long)]
    pub phone: String,
    /// Date of birth (YYYY-MM-DD).
    #[arg(long, value_name = "date")]
    pub date_of_birth: Option<NaiveDate>,
    /// Postal address.
    #[arg(long)]
    pub address: Option<String>,
    /// Record the member as not allowed to borrow.
    #[arg(long)]
    pub inactive: bool,
}

impl From<MemberArgs> for MemberDraft {
    fn from(args: MemberArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            date_of_birth: args.date_of_birth,
            address: args.address,
            active: !args.inactive,
        }
    }
}

/// Lending operations.
#[derive(Debug, Clone, Subcommand)]
pub enum LoanCommand {
    /// Every loan with derived overdue state.
    List,
    /// Loans alongside lendable books and active members.
    Board,
    /// One loan.
    Show {
        /// Transaction identifier.
        id: TransactionId,
    },
    /// Loans of one member.
    Member {
        /// Member identifier.
        id: MemberId,
        /// Only loans still out.
        #[arg(long)]
        active: bool,
    },
    /// Lend a copy.
    Borrow {
        /// Book to lend.
        #[arg(long)]
        book: BookId,
        /// Borrowing member.
        #[arg(long)]
        member: MemberId,
    },
    /// Take a copy back.
    Return {
        /// Transaction identifier.
        id: TransactionId,
    },
}

/// Reports.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ReportCommand {
    /// Loans past their due date, with fines.
    Overdue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn grammar_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["library-client", "members", "list"], View::Members)]
    #[case(&["library-client", "signin", "--username", "u", "--password", "p"], View::Login)]
    #[case(&["library-client", "loans", "borrow", "--book", "1", "--member", "2"], View::Transactions)]
    #[case(&["library-client", "my-books"], View::MyBooks)]
    #[case(&["library-client", "reports", "overdue"], View::Reports)]
    fn commands_enter_their_view(#[case] argv: &[&str], #[case] view: View) {
        let cli = Cli::try_parse_from(argv).expect("parse");
        assert_eq!(cli.command.view(), view);
    }

    #[test]
    fn role_names_parse_case_insensitively() {
        let cli = Cli::try_parse_from([
            "library-client",
            "signup",
            "--username",
            "u",
            "--email",
            "u@example.test",
            "--password",
            "p",
            "--role",
            "LIBRARIAN",
        ])
        .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Signup {
                role: Role::Librarian,
                ..
            }
        ));
    }

    #[test]
    fn non_positive_ids_are_refused() {
        assert!(Cli::try_parse_from(["library-client", "books", "show", "0"]).is_err());
    }
}
