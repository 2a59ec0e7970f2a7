use serde::{Deserialize, Serialize};
use std::fmt;

/// Accounting classification attached to a statement row (a "tcode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CategoryCodeRepr", into = "i32")]
pub struct CategoryCode(pub i32);

impl CategoryCode {
    pub const CASH_ACCOUNTING_VAT: CategoryCode = CategoryCode(1);
    pub const BANK_CHARGES: CategoryCode = CategoryCode(2);
    pub const ACCOUNTANCY: CategoryCode = CategoryCode(3);
    pub const OTHER: CategoryCode = CategoryCode(4);
    pub const CORPORATION_TAX: CategoryCode = CategoryCode(5);
    pub const VAT_PAYMENT: CategoryCode = CategoryCode(6);
    pub const PAYE_OR_NIC: CategoryCode = CategoryCode(7);
    pub const LOAN_PAYMENTS: CategoryCode = CategoryCode(8);
    pub const FIXED_ASSET_PURCHASES: CategoryCode = CategoryCode(9);

    /// The well-known name for this code, if it is one of the built-in codes.
    pub fn name(self) -> Option<&'static str> {
        NAMED_CATEGORIES
            .iter()
            .find(|(_, code)| *code == self)
            .map(|(name, _)| *name)
    }
}

pub const NAMED_CATEGORIES: &[(&str, CategoryCode)] = &[
    ("cash_accounting_vat", CategoryCode::CASH_ACCOUNTING_VAT),
    ("bank_charges", CategoryCode::BANK_CHARGES),
    ("accountancy", CategoryCode::ACCOUNTANCY),
    ("other", CategoryCode::OTHER),
    ("corporation_tax", CategoryCode::CORPORATION_TAX),
    ("vat_payment", CategoryCode::VAT_PAYMENT),
    ("paye_or_nic", CategoryCode::PAYE_OR_NIC),
    ("loan_payments", CategoryCode::LOAN_PAYMENTS),
    ("fixed_asset_purchases", CategoryCode::FIXED_ASSET_PURCHASES),
];

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CategoryCode> for i32 {
    fn from(code: CategoryCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for CategoryCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return Ok(CategoryCode(n));
        }
        let lower = s.to_lowercase();
        NAMED_CATEGORIES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, code)| *code)
            .ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}

/// Config files may spell a code either as a number or by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryCodeRepr {
    Code(i32),
    Name(String),
}

impl TryFrom<CategoryCodeRepr> for CategoryCode {
    type Error = String;

    fn try_from(repr: CategoryCodeRepr) -> Result<Self, Self::Error> {
        match repr {
            CategoryCodeRepr::Code(n) => Ok(CategoryCode(n)),
            CategoryCodeRepr::Name(name) => name.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_numbers_and_names() {
        assert_eq!(CategoryCode::from_str("4").unwrap(), CategoryCode::OTHER);
        assert_eq!(CategoryCode::from_str("Corporation_Tax").unwrap(), CategoryCode::CORPORATION_TAX);
        assert!(CategoryCode::from_str("groceries").is_err());
    }

    #[test]
    fn name_lookup() {
        assert_eq!(CategoryCode::PAYE_OR_NIC.name(), Some("paye_or_nic"));
        assert_eq!(CategoryCode(42).name(), None);
    }

    #[test]
    fn deserializes_from_either_form() {
        let codes: Vec<CategoryCode> = serde_json::from_str(r#"[2, "bank_charges", "other"]"#).unwrap();
        assert_eq!(
            codes,
            vec![CategoryCode::BANK_CHARGES, CategoryCode::BANK_CHARGES, CategoryCode::OTHER]
        );
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&CategoryCode::VAT_PAYMENT).unwrap(), "6");
    }

    #[test]
    fn display_is_the_bare_code() {
        assert_eq!(CategoryCode::OTHER.to_string(), "4");
    }
}
