use moneyout_core::{CategoryCode, DataRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::CategoryRuleEngine;

/// Row metadata that a context column can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextValue {
    /// The row's category code.
    Category,
    /// Name of the rule that classified the row.
    Rule,
}

/// Where an output column's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSource {
    /// Copy of an input column.
    Input { column: usize },
    /// Always empty.
    Null,
    Context { value: ContextValue },
    /// Populated only for rows in `category`: from `column` when given,
    /// otherwise from the matched rule's comment.
    Gated {
        category: CategoryCode,
        #[serde(default)]
        column: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub index: usize,
    pub source: ColumnSource,
}

impl OutputColumn {
    pub fn new(name: &str, index: usize, source: ColumnSource) -> Self {
        Self {
            name: name.to_string(),
            index,
            source,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Output layout has no columns")]
    Empty,
    #[error("Output column {index} is declared by both '{first}' and '{second}'")]
    Duplicate {
        index: usize,
        first: String,
        second: String,
    },
    #[error("Output column {index} is not declared")]
    Gap { index: usize },
}

/// Validated output layout: one column per index from 0 to the highest declared.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    columns: Vec<OutputColumn>,
}

impl OutputLayout {
    pub fn new(columns: Vec<OutputColumn>) -> Result<Self, LayoutError> {
        let width = columns
            .iter()
            .map(|c| c.index)
            .max()
            .map(|max| max + 1)
            .ok_or(LayoutError::Empty)?;

        let mut slots: Vec<Option<OutputColumn>> = vec![None; width];
        for column in columns {
            let index = column.index;
            if let Some(existing) = &slots[index] {
                return Err(LayoutError::Duplicate {
                    index,
                    first: existing.name.clone(),
                    second: column.name,
                });
            }
            slots[index] = Some(column);
        }

        let columns = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(LayoutError::Gap { index }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    /// Number of output columns, `max(index) + 1`.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Projects a row into output column order.
    pub fn project(&self, row: &DataRow, rules: &CategoryRuleEngine) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| column_value(&c.source, row, rules))
            .collect()
    }
}

fn column_value(source: &ColumnSource, row: &DataRow, rules: &CategoryRuleEngine) -> String {
    match source {
        ColumnSource::Input { column } => row.field(*column).unwrap_or_default().to_string(),
        ColumnSource::Null => String::new(),
        ColumnSource::Context {
            value: ContextValue::Category,
        } => row.category().map(|c| c.to_string()).unwrap_or_default(),
        ColumnSource::Context {
            value: ContextValue::Rule,
        } => row.rule_name().unwrap_or_default().to_string(),
        ColumnSource::Gated { category, column } => {
            let Some(classification) = row
                .classification
                .as_ref()
                .filter(|c| c.category == *category)
            else {
                return String::new();
            };
            match column {
                Some(column) => row.field(*column).unwrap_or_default().to_string(),
                None => rules
                    .rule(classification.rule_index)
                    .and_then(|rule| rule.comment.clone())
                    .unwrap_or_default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CategoryRule, MatchType, RowClassifier};

    fn rules() -> CategoryRuleEngine {
        CategoryRuleEngine::new(vec![
            CategoryRule {
                name: "argos".to_string(),
                column: 1,
                pattern: "argos".to_string(),
                match_type: MatchType::Contains,
                category: CategoryCode::OTHER,
                comment: Some("computer equipment".to_string()),
            },
            CategoryRule {
                name: "corporation_tax".to_string(),
                column: 1,
                pattern: "hmrc shipley".to_string(),
                match_type: MatchType::Contains,
                category: CategoryCode::CORPORATION_TAX,
                comment: None,
            },
        ])
        .unwrap()
    }

    fn layout() -> OutputLayout {
        OutputLayout::new(vec![
            OutputColumn::new("TCODE", 5, ColumnSource::Context { value: ContextValue::Category }),
            OutputColumn::new("DATE", 0, ColumnSource::Input { column: 0 }),
            OutputColumn::new("BANK_2", 1, ColumnSource::Null),
            OutputColumn::new(
                "OTHER_USE",
                2,
                ColumnSource::Gated { category: CategoryCode::OTHER, column: Some(4) },
            ),
            OutputColumn::new(
                "CORPORATION_TAX",
                3,
                ColumnSource::Gated { category: CategoryCode::CORPORATION_TAX, column: Some(4) },
            ),
            OutputColumn::new(
                "COMMENTS",
                4,
                ColumnSource::Gated { category: CategoryCode::OTHER, column: None },
            ),
        ])
        .unwrap()
    }

    fn classified(details: &str) -> DataRow {
        let mut row = DataRow::from_fields(["2022-08-01", details, "DEB", "", "12.50", "90.00"]);
        rules().classify(&mut row);
        row
    }

    #[test]
    fn width_is_max_index_plus_one() {
        assert_eq!(layout().width(), 6);
    }

    #[test]
    fn header_is_positioned_by_index() {
        assert_eq!(
            layout().header(),
            vec!["DATE", "BANK_2", "OTHER_USE", "CORPORATION_TAX", "COMMENTS", "TCODE"]
        );
    }

    #[test]
    fn gated_columns_follow_category() {
        let out = layout().project(&classified("ARGOS LTD"), &rules());
        assert_eq!(out, vec!["2022-08-01", "", "12.50", "", "computer equipment", "4"]);

        let out = layout().project(&classified("HMRC SHIPLEY"), &rules());
        assert_eq!(out, vec!["2022-08-01", "", "", "12.50", "", "5"]);
    }

    #[test]
    fn unclassified_row_has_only_direct_columns() {
        let out = layout().project(&classified("TESCO"), &rules());
        assert_eq!(out, vec!["2022-08-01", "", "", "", "", ""]);
    }

    #[test]
    fn rule_context_value() {
        let layout = OutputLayout::new(vec![OutputColumn::new(
            "RULE",
            0,
            ColumnSource::Context { value: ContextValue::Rule },
        )])
        .unwrap();
        assert_eq!(layout.project(&classified("argos"), &rules()), vec!["argos"]);
    }

    #[test]
    fn missing_input_column_is_empty() {
        let layout = OutputLayout::new(vec![OutputColumn::new("X", 0, ColumnSource::Input { column: 9 })]).unwrap();
        assert_eq!(layout.project(&classified("argos"), &rules()), vec![""]);
    }

    #[test]
    fn gap_is_rejected() {
        let err = OutputLayout::new(vec![
            OutputColumn::new("A", 0, ColumnSource::Null),
            OutputColumn::new("C", 2, ColumnSource::Null),
        ])
        .unwrap_err();
        assert_eq!(err, LayoutError::Gap { index: 1 });
    }

    #[test]
    fn duplicate_is_rejected() {
        let err = OutputLayout::new(vec![
            OutputColumn::new("A", 0, ColumnSource::Null),
            OutputColumn::new("B", 0, ColumnSource::Null),
        ])
        .unwrap_err();
        assert!(matches!(err, LayoutError::Duplicate { index: 0, .. }));
    }

    #[test]
    fn empty_layout_is_rejected() {
        assert_eq!(OutputLayout::new(vec![]).unwrap_err(), LayoutError::Empty);
    }
}
