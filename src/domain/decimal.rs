//! Exact decimal numeric type backed by rust_decimal.
//!
//! Prices, reserves and volumes originate from fixed-point ledger quantities, so
//! every comparison and sum has to be exact. Values are persisted as canonical
//! strings so that a stored bucket reloads to the identical value.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lossless decimal numeric type for prices, volumes and liquidity.
///
/// Serializes to a JSON string (not a float) so no precision is lost in storage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Exact sum.
    ///
    /// # Errors
    /// Returns [`DecimalOverflow`] if the sum does not fit.
    pub fn checked_add(&self, rhs: Decimal) -> Result<Decimal, DecimalOverflow> {
        self.0
            .checked_add(rhs.0)
            .map(Decimal)
            .ok_or(DecimalOverflow::new("+", *self, rhs))
    }

    /// Exact difference.
    ///
    /// # Errors
    /// Returns [`DecimalOverflow`] if the difference does not fit.
    pub fn checked_sub(&self, rhs: Decimal) -> Result<Decimal, DecimalOverflow> {
        self.0
            .checked_sub(rhs.0)
            .map(Decimal)
            .ok_or(DecimalOverflow::new("-", *self, rhs))
    }

    /// Exact product.
    ///
    /// # Errors
    /// Returns [`DecimalOverflow`] if the product does not fit.
    pub fn checked_mul(&self, rhs: Decimal) -> Result<Decimal, DecimalOverflow> {
        self.0
            .checked_mul(rhs.0)
            .map(Decimal)
            .ok_or(DecimalOverflow::new("*", *self, rhs))
    }

    /// Division that yields `None` on a zero divisor or overflow instead of panicking.
    pub fn checked_div(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

/// An arithmetic result outside the representable decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decimal overflow: {lhs} {op} {rhs}")]
pub struct DecimalOverflow {
    pub op: &'static str,
    pub lhs: Decimal,
    pub rhs: Decimal,
}

impl DecimalOverflow {
    fn new(op: &'static str, lhs: Decimal, rhs: Decimal) -> Self {
        Self { op, lhs, rhs }
    }
}
