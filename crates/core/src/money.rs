use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not normalize amount \"{0}\". It does not seem to be a valid number.")]
pub struct MalformedAmount(pub String);

/// Reduce a free-text amount to signed integer minor units (cents).
///
/// Every character that is not an ASCII digit or a minus sign is stripped and
/// the remainder is parsed as a base-10 integer. Decimal points are stripped
/// like anything else, so the input must already carry the minor unit as its
/// trailing digits: "45.30" and "45,30" both normalize to 4530.
pub fn normalize_amount(text: &str) -> Result<i64, MalformedAmount> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    stripped
        .parse::<i64>()
        .map_err(|_| MalformedAmount(text.to_string()))
}

/// Display-side view of an amount. The authoritative value is always the
/// integer cent count; `Money` is derived from it and never hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Formats the amount with a trailing currency code, e.g. "45.30 EUR".
    pub fn display_with(self, currency: &str) -> String {
        format!("{:.2} {currency}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}
