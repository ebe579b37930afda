//! Numeric identifiers assigned by the catalogue backend.
//!
//! The backend hands out positive 64-bit ids for every resource. Each
//! resource gets its own newtype so a member id can never be passed where a
//! book id is expected.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an identifier fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// The input was not an integer.
    #[error("identifier must be an integer: {message}")]
    NotAnInteger {
        /// Parser error message.
        message: String,
    },
    /// The integer was zero or negative.
    #[error("identifier must be positive, got {value}")]
    NotPositive {
        /// Rejected value.
        value: i64,
    },
}

impl From<ParseIntError> for IdParseError {
    fn from(value: ParseIntError) -> Self {
        Self::NotAnInteger {
            message: value.to_string(),
        }
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw backend identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw identifier value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s.trim().parse()?;
                if value <= 0 {
                    return Err(IdParseError::NotPositive { value });
                }
                Ok(Self(value))
            }
        }
    };
}

define_id!(
    /// Identifier of a catalogue book.
    BookId
);
define_id!(
    /// Identifier of a library member record.
    MemberId
);
define_id!(
    /// Identifier of a borrow/return transaction.
    TransactionId
);
define_id!(
    /// Identifier of a user account (the signed-in principal).
    UserId
);
