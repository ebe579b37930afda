//! Command-line front end.
//!
//! [`Cli`] is the clap grammar; [`Desk`] runs one parsed [`Command`] against
//! a backend and a session store, writing plain text to any [`std::io::Write`].

mod command;
mod desk;
mod render;

pub use command::{
    BookArgs, BookCommand, Cli, Command, LoanCommand, MemberArgs, MemberCommand, ReportCommand,
};
pub use desk::{CliError, Desk, Outcome};
