use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of the month token in an underscore-delimited statement file name.
const MONTH_TOKEN: usize = 2;
const YEAR_TOKEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("File name '{file_name}' has no {token} token")]
    MissingToken {
        file_name: String,
        token: &'static str,
    },
}

/// The month and year a statement covers, taken verbatim from its file name:
/// `Transactions_Export_Aug_2022_37511919.csv` covers `Aug` `2022`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub month: String,
    pub year: String,
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.month, self.year)
    }
}

impl StatementPeriod {
    pub fn from_file_name(file_name: &str) -> Result<Self, PeriodError> {
        let tokens: Vec<&str> = file_name.split('_').collect();
        let token = |idx: usize, token: &'static str| {
            tokens
                .get(idx)
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
                .ok_or_else(|| PeriodError::MissingToken {
                    file_name: file_name.to_string(),
                    token,
                })
        };
        Ok(StatementPeriod {
            month: token(MONTH_TOKEN, "month")?,
            year: token(YEAR_TOKEN, "year")?,
        })
    }

    /// The calendar month, when the token is a recognisable month name.
    pub fn calendar_month(&self) -> Option<Month> {
        self.month.parse().ok()
    }

    pub fn calendar_year(&self) -> Option<i32> {
        self.year.parse().ok()
    }

    /// True when both tokens look like a real month and year.
    pub fn is_recognised(&self) -> bool {
        self.calendar_month().is_some() && self.calendar_year().is_some()
    }

    /// Output file name for this period, e.g. `Aug2022`.
    pub fn output_file_name(&self) -> String {
        self.to_string()
    }
}
