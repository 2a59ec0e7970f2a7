use serde::{Deserialize, Serialize};

use super::category::CategoryCode;

/// The result of matching a row against the category rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: CategoryCode,
    /// Name of the rule that matched. Names need not be unique.
    pub rule: String,
    /// Position of the matched rule in its rule list.
    pub rule_index: usize,
}

/// One data row of a statement: its fields in column order plus the
/// classification assigned once the row is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub fields: Vec<String>,
    pub classification: Option<Classification>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataRow {
            fields: fields.into_iter().map(Into::into).collect(),
            classification: None,
        }
    }

    pub fn push_field(&mut self, field: String) {
        self.fields.push(field);
    }

    /// Field at `column`, or `None` when the row is shorter than that.
    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn category(&self) -> Option<CategoryCode> {
        self.classification.as_ref().map(|c| c.category)
    }

    pub fn rule_name(&self) -> Option<&str> {
        self.classification.as_ref().map(|c| c.rule.as_str())
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }
}
