//! Fine amounts in minor currency units.

use std::fmt;

use serde::{Deserialize, Serialize};

const CENTS_PER_UNIT: u64 = 100;

/// Amount held in cents; wire values are decimal currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// No charge.
    pub const ZERO: Self = Self(0);

    /// Amount from a cent count.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a wire decimal, rounding to the nearest cent.
    ///
    /// # Examples
    /// ```
    /// use library_client::domain::Money;
    ///
    /// assert_eq!(Money::from_decimal(4.0).cents(), 400);
    /// assert_eq!(Money::from_decimal(0.1).cents(), 10);
    /// ```
    #[expect(
        clippy::cast_possible_truncation,
        reason = "fines are small and rounded to whole cents before the cast"
    )]
    #[expect(
        clippy::float_arithmetic,
        reason = "the wire carries fines as decimal currency units"
    )]
    pub fn from_decimal(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// Decimal currency units for the wire.
    #[expect(
        clippy::cast_precision_loss,
        reason = "cent counts stay far below f64 mantissa precision"
    )]
    #[expect(
        clippy::float_arithmetic,
        reason = "the wire carries fines as decimal currency units"
    )]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            magnitude.div_euclid(CENTS_PER_UNIT),
            magnitude.rem_euclid(CENTS_PER_UNIT)
        )
    }
}

/// Fine charged per overdue day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineRate(Money);

impl FineRate {
    /// Default rate of 1.00 currency unit per day.
    pub const DEFAULT_CENTS_PER_DAY: i64 = 100;

    /// Rate from a per-day amount.
    pub const fn per_day(amount: Money) -> Self {
        Self(amount)
    }

    /// Per-day amount.
    pub const fn daily(self) -> Money {
        self.0
    }

    /// Fine for `days` overdue days; non-positive days cost nothing.
    pub fn fine_for_days(self, days: i64) -> Money {
        Money::from_cents(self.0.cents().saturating_mul(days.max(0)))
    }
}

impl Default for FineRate {
    fn default() -> Self {
        Self::per_day(Money::from_cents(Self::DEFAULT_CENTS_PER_DAY))
    }
}
