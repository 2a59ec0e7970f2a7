use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// A statement amount as written in a column, e.g. `45.00` or `(1,200.50)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Parses a column value. Accepts accounting parentheses for negatives,
    /// thousands separators and a leading currency symbol.
    pub fn parse(s: &str) -> Result<Money, MoneyError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MoneyError::Empty);
        }
        let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
            (true, &s[1..s.len() - 1])
        } else {
            (false, s)
        };
        let cleaned = s.replace([',', '£', '$', '€', ' '], "");
        let mut dec =
            Decimal::from_str(&cleaned).map_err(|_| MoneyError::Invalid(s.to_string()))?;
        if negative {
            dec = -dec;
        }
        Ok(Money(dec))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Decimal {
        Money::parse(s).unwrap().as_decimal()
    }

    #[test]
    fn parse_plain() {
        assert_eq!(money("45.00"), Decimal::new(4500, 2));
    }

    #[test]
    fn parse_with_symbol_and_separators() {
        assert_eq!(money("£1,234.56"), Decimal::new(123456, 2));
    }

    #[test]
    fn parse_accounting_parens() {
        assert_eq!(money("(75.25)"), Decimal::new(-7525, 2));
    }

    #[test]
    fn parse_empty_is_distinct_error() {
        assert_eq!(Money::parse("   "), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("DEB"), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(Money::parse("50.00").unwrap() > Money::zero());
        assert!(Money::parse("9.5").unwrap() < Money::parse("10").unwrap());
    }
}
