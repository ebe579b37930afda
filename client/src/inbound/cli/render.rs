//! Plain-text rendering of domain records.

use std::io::{self, Write};

use crate::domain::{
    Book, BoardSnapshot, FineSource, LoanView, Member, OverdueReportView, Session, View,
};

pub(super) fn session(out: &mut impl Write, session: &Session, menu: &[View]) -> io::Result<()> {
    let principal = session.principal();
    writeln!(
        out,
        "signed in as {} (#{}) roles: {}",
        principal.username(),
        principal.id(),
        principal.roles()
    )?;
    if let Some(email) = principal.email() {
        writeln!(out, "email: {email}")?;
    }
    let paths: Vec<String> = menu.iter().map(ToString::to_string).collect();
    writeln!(out, "menu: {}", paths.join(" "))
}

pub(super) fn books(out: &mut impl Write, books: &[Book]) -> io::Result<()> {
    if books.is_empty() {
        return writeln!(out, "no books");
    }
    for entry in books {
        book(out, entry)?;
    }
    Ok(())
}

pub(super) fn book(out: &mut impl Write, book: &Book) -> io::Result<()> {
    let copies = book.copies();
    write!(
        out,
        "#{:<5} {} by {}  isbn {}  {}/{} on shelf",
        book.id,
        book.title,
        book.author,
        book.isbn,
        copies.available(),
        copies.total()
    )?;
    if let Some(category) = &book.category {
        write!(out, "  [{category}]")?;
    }
    writeln!(out)
}

pub(super) fn members(out: &mut impl Write, members: &[Member]) -> io::Result<()> {
    if members.is_empty() {
        return writeln!(out, "no members");
    }
    for entry in members {
        member(out, entry)?;
    }
    Ok(())
}

pub(super) fn member(out: &mut impl Write, member: &Member) -> io::Result<()> {
    writeln!(
        out,
        "#{:<5} {}  {}  {}  {}",
        member.id,
        member.full_name(),
        member.email,
        member.phone,
        if member.active { "active" } else { "inactive" }
    )
}

pub(super) fn loans(out: &mut impl Write, loans: &[LoanView]) -> io::Result<()> {
    if loans.is_empty() {
        return writeln!(out, "no loans");
    }
    for entry in loans {
        loan(out, entry)?;
    }
    Ok(())
}

pub(super) fn loan(out: &mut impl Write, view: &LoanView) -> io::Result<()> {
    let transaction = &view.transaction;
    let title = transaction
        .book
        .title
        .clone()
        .unwrap_or_else(|| format!("book #{}", transaction.book.id));
    let status = if view.overdue {
        "OVERDUE"
    } else {
        transaction.status.as_str()
    };
    write!(
        out,
        "#{:<5} {}  to {}  borrowed {}  due {}  {}",
        transaction.id,
        title,
        transaction.member.display_name(),
        transaction.borrow_date,
        transaction.due_date,
        status
    )?;
    if let Some(returned) = transaction.return_date {
        write!(out, " on {returned}")?;
    }
    if view.days_overdue() > 0 || view.fine.source == FineSource::Backend {
        let source = match view.fine.source {
            FineSource::Backend => "charged",
            FineSource::Estimated => "estimated",
        };
        write!(
            out,
            "  {} days late, fine {} ({source})",
            view.days_overdue(),
            view.fine.amount
        )?;
    }
    writeln!(out)
}

pub(super) fn report(out: &mut impl Write, report: &OverdueReportView) -> io::Result<()> {
    writeln!(out, "{} overdue", report.total)?;
    for entry in &report.entries {
        loan(out, entry)?;
    }
    Ok(())
}

pub(super) fn board(out: &mut impl Write, snapshot: &BoardSnapshot) -> io::Result<()> {
    writeln!(out, "loans:")?;
    loans(out, &snapshot.loans)?;
    writeln!(out, "lendable books:")?;
    books(out, &snapshot.lendable_books)?;
    writeln!(out, "active members:")?;
    members(out, &snapshot.active_members)
}
