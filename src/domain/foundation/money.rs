//! Monetary value object in integer minor-currency units.
//!
//! All order totals and payment amounts are carried as integer minor
//! units (paise, cents) to keep arithmetic exact. Floats never appear
//! in money paths.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A non-negative amount of money in minor units of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: String,
}

impl Money {
    /// Creates a new amount, validating the minor-unit value and currency code.
    ///
    /// The currency must be a three-letter uppercase ISO 4217 code.
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Result<Self, ValidationError> {
        if amount_minor < 0 {
            return Err(ValidationError::out_of_range(
                "amount_minor",
                0,
                i64::MAX,
                amount_minor,
            ));
        }
        let currency = currency.into();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected three-letter uppercase ISO 4217 code",
            ));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Zero in the given currency.
    pub fn zero(currency: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(0, currency)
    }

    /// Returns the amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the ISO 4217 currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, ValidationError> {
        if self.currency != other.currency {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("cannot add {} to {}", other.currency, self.currency),
            ));
        }
        Money::new(self.amount_minor + other.amount_minor, self.currency.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount_minor, self.currency)
    }
}
