//! Catalogue books and their copy accounting.
//!
//! [`CopyCount`] is the single source of truth for lending capacity. It keeps
//! `0 <= available <= total` and `total >= 1`, and only moves `available` by
//! one copy per borrow or return.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::BookId;

/// Errors raised by copy accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CopyCountError {
    /// A book must own at least one copy.
    #[error("total copies must be at least 1")]
    NoCopies,
    /// More copies on the shelf than the library owns.
    #[error("available copies ({available}) exceed total copies ({total})")]
    AvailableExceedsTotal {
        /// Requested available count.
        available: u32,
        /// Owned copies.
        total: u32,
    },
    /// Every copy is already on loan.
    #[error("No available copies of this book")]
    NoneAvailable,
    /// Every copy is already on the shelf.
    #[error("all copies of this book are already on the shelf")]
    AllOnShelf,
    /// A new total would be lower than the copies currently on loan.
    #[error("total copies ({total}) cannot be below copies on loan ({on_loan})")]
    TotalBelowLoans {
        /// Requested total.
        total: u32,
        /// Copies currently lent out.
        on_loan: u32,
    },
}

/// Owned and shelved copies of one book.
///
/// # Examples
/// ```
/// use library_client::domain::CopyCount;
///
/// let mut copies = CopyCount::new(2, 2).unwrap();
/// copies.checkout().unwrap();
/// assert_eq!(copies.available(), 1);
/// copies.checkin().unwrap();
/// assert_eq!(copies.available(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyCount {
    total: u32,
    available: u32,
}

impl CopyCount {
    /// Validate a copy count pair.
    pub fn new(total: u32, available: u32) -> Result<Self, CopyCountError> {
        if total == 0 {
            return Err(CopyCountError::NoCopies);
        }
        if available > total {
            return Err(CopyCountError::AvailableExceedsTotal { available, total });
        }
        Ok(Self { total, available })
    }

    /// Copies the library owns.
    pub const fn total(self) -> u32 {
        self.total
    }

    /// Copies currently on the shelf.
    pub const fn available(self) -> u32 {
        self.available
    }

    /// Copies currently on loan.
    pub const fn on_loan(self) -> u32 {
        self.total - self.available
    }

    /// Whether at least one copy can be lent.
    pub const fn can_lend(self) -> bool {
        self.available > 0
    }

    /// Take one copy off the shelf.
    pub fn checkout(&mut self) -> Result<(), CopyCountError> {
        self.available = self
            .available
            .checked_sub(1)
            .ok_or(CopyCountError::NoneAvailable)?;
        Ok(())
    }

    /// Put one copy back on the shelf.
    pub fn checkin(&mut self) -> Result<(), CopyCountError> {
        if self.available >= self.total {
            return Err(CopyCountError::AllOnShelf);
        }
        self.available += 1;
        Ok(())
    }

    /// Change the owned total, keeping copies on loan accounted for.
    pub fn with_total(self, total: u32) -> Result<Self, CopyCountError> {
        let on_loan = self.on_loan();
        let available = total
            .checked_sub(on_loan)
            .ok_or(CopyCountError::TotalBelowLoans { total, on_loan })?;
        Self::new(total, available)
    }
}

/// Error returned when an ISBN is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ISBN must be 10 or 13 digits (ISBN-10 may end in X): {raw}")]
pub struct IsbnError {
    /// Rejected input.
    pub raw: String,
}

/// International Standard Book Number, normalised without separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Isbn(String);

impl Isbn {
    /// Parse an ISBN-10 or ISBN-13, ignoring hyphens and spaces.
    ///
    /// # Examples
    /// ```
    /// use library_client::domain::Isbn;
    ///
    /// let isbn = Isbn::parse("978-0-13-468599-1").unwrap();
    /// assert_eq!(isbn.as_str(), "9780134685991");
    /// assert!(Isbn::parse("12-34").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, IsbnError> {
        let compact: String = raw
            .chars()
            .filter(|ch| !matches!(ch, '-' | ' '))
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        let valid = match compact.len() {
            13 => compact.chars().all(|ch| ch.is_ascii_digit()),
            10 => compact
                .char_indices()
                .all(|(index, ch)| ch.is_ascii_digit() || (index == 9 && ch == 'X')),
            _ => false,
        };
        if valid {
            Ok(Self(compact))
        } else {
            Err(IsbnError {
                raw: raw.to_owned(),
            })
        }
    }

    /// Keep an ISBN the catalogue already holds.
    ///
    /// Well-formed values are normalised as [`Isbn::parse`] does; anything
    /// else is kept as recorded, trimmed.
    ///
    /// # Examples
    /// ```
    /// use library_client::domain::Isbn;
    ///
    /// assert_eq!(Isbn::from_record("0-306-40615-2").as_str(), "0306406152");
    /// assert_eq!(Isbn::from_record(" LEGACY-42 ").as_str(), "LEGACY-42");
    /// ```
    #[must_use]
    pub fn from_record(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| Self(raw.trim().to_owned()))
    }

    /// Normalised digits, or the recorded value for legacy entries.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation failures for book form values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    /// A required text field was blank.
    #[error("{field} must not be empty")]
    MissingField {
        /// Name of the blank field.
        field: &'static str,
    },
    /// The ISBN is malformed.
    #[error(transparent)]
    Isbn(#[from] IsbnError),
    /// The copy counts break the catalogue bounds.
    #[error(transparent)]
    Copies(#[from] CopyCountError),
}

impl BookValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
            Self::Isbn(_) => "isbn",
            Self::Copies(_) => "totalCopies",
        }
    }
}

/// Book form values submitted for create or update.
///
/// On create `available_copies` is normally `None` and every copy starts on
/// the shelf; edits send the operator's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// ISBN as typed; validated by [`BookDraft::validate`].
    pub isbn: String,
    /// Shelf category.
    pub category: Option<String>,
    /// Publisher.
    pub publisher: Option<String>,
    /// Publication date.
    pub publication_date: Option<NaiveDate>,
    /// Owned copies.
    pub total_copies: u32,
    /// Copies on the shelf; defaults to `total_copies`.
    pub available_copies: Option<u32>,
}

impl BookDraft {
    /// Check required fields, ISBN shape, and copy bounds.
    pub fn validate(&self) -> Result<(Isbn, CopyCount), BookValidationError> {
        for (field, value) in [("title", &self.title), ("author", &self.author)] {
            if value.trim().is_empty() {
                return Err(BookValidationError::MissingField { field });
            }
        }
        let isbn = Isbn::parse(&self.isbn)?;
        let copies = CopyCount::new(
            self.total_copies,
            self.available_copies.unwrap_or(self.total_copies),
        )?;
        Ok((isbn, copies))
    }
}

/// A catalogue book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Backend identifier.
    pub id: BookId,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// ISBN; unique per catalogue.
    pub isbn: Isbn,
    /// Shelf category.
    pub category: Option<String>,
    /// Publisher.
    pub publisher: Option<String>,
    /// Publication date.
    pub publication_date: Option<NaiveDate>,
    copies: CopyCount,
}

impl Book {
    /// Assemble a book from validated parts.
    pub fn new(id: BookId, draft: &BookDraft, isbn: Isbn, copies: CopyCount) -> Self {
        Self {
            id,
            title: draft.title.trim().to_owned(),
            author: draft.author.trim().to_owned(),
            isbn,
            category: draft.category.clone(),
            publisher: draft.publisher.clone(),
            publication_date: draft.publication_date,
            copies,
        }
    }

    /// Copy accounting.
    pub const fn copies(&self) -> CopyCount {
        self.copies
    }

    /// Mutable copy accounting for lifecycle transitions.
    pub const fn copies_mut(&mut self) -> &mut CopyCount {
        &mut self.copies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> BookDraft {
        BookDraft {
            title: "Dune".to_owned(),
            author: "Frank Herbert".to_owned(),
            isbn: "0-441-17271-7".to_owned(),
            category: Some("Fiction".to_owned()),
            publisher: None,
            publication_date: None,
            total_copies: 2,
            available_copies: None,
        }
    }

    #[rstest]
    #[case(0, 0, CopyCountError::NoCopies)]
    #[case(2, 3, CopyCountError::AvailableExceedsTotal { available: 3, total: 2 })]
    fn copy_bounds_are_enforced(
        #[case] total: u32,
        #[case] available: u32,
        #[case] expected: CopyCountError,
    ) {
        assert_eq!(CopyCount::new(total, available), Err(expected));
    }

    #[test]
    fn checkout_stops_at_zero() {
        let mut copies = CopyCount::new(1, 1).expect("copies");
        copies.checkout().expect("first checkout");
        assert_eq!(copies.checkout(), Err(CopyCountError::NoneAvailable));
        assert_eq!(copies.available(), 0);
    }

    #[test]
    fn checkin_stops_at_total() {
        let mut copies = CopyCount::new(2, 2).expect("copies");
        assert_eq!(copies.checkin(), Err(CopyCountError::AllOnShelf));
        assert_eq!(copies.available(), 2);
    }

    #[rstest]
    #[case(3, Ok((3, 2)))]
    #[case(1, Ok((1, 0)))]
    #[case(0, Err(CopyCountError::TotalBelowLoans { total: 0, on_loan: 1 }))]
    fn with_total_keeps_loans(
        #[case] total: u32,
        #[case] expected: Result<(u32, u32), CopyCountError>,
    ) {
        let copies = CopyCount::new(2, 1).expect("copies");
        let result = copies
            .with_total(total)
            .map(|updated| (updated.total(), updated.available()));
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case("9780441172719", "9780441172719")]
    #[case("0-441-17271-7", "0441172717")]
    #[case("080442957x", "080442957X")]
    fn isbn_normalises(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Isbn::parse(raw).expect("valid isbn").as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("12345")]
    #[case("X123456789")]
    #[case("978044117271A")]
    fn isbn_rejects_malformed(#[case] raw: &str) {
        assert!(Isbn::parse(raw).is_err());
    }

    #[rstest]
    fn draft_defaults_available_to_total(draft: BookDraft) {
        let (_, copies) = draft.validate().expect("valid draft");
        assert_eq!((copies.total(), copies.available()), (2, 2));
    }

    #[rstest]
    fn draft_reports_offending_field(mut draft: BookDraft) {
        draft.isbn = "nope".to_owned();
        assert_eq!(draft.validate().expect_err("bad isbn").field(), "isbn");

        draft.isbn = "9780441172719".to_owned();
        draft.total_copies = 0;
        assert_eq!(
            draft.validate().expect_err("no copies").field(),
            "totalCopies"
        );

        draft.total_copies = 1;
        draft.title = String::new();
        assert_eq!(draft.validate().expect_err("no title").field(), "title");
    }
}
