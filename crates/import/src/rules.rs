use moneyout_core::{CategoryCode, Classification, DataRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRule {
    pub name: String,
    /// Input column whose text the pattern is matched against.
    pub column: usize,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category: CategoryCode,
    /// Fixed text a gated output column can emit for rows this rule classified.
    #[serde(default)]
    pub comment: Option<String>,
}

/// All match types ignore case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Anything that can tag a completed row with a category.
pub trait RowClassifier {
    fn classify(&self, row: &mut DataRow);
}

/// Internal pairing of a rule with its prepared matcher.
struct CompiledRule {
    rule: CategoryRule,
    matcher: Matcher,
}

enum Matcher {
    Contains(String),
    Exact(String),
    Regex(regex::Regex),
}

impl Matcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(needle) => text.to_lowercase().contains(needle.as_str()),
            Matcher::Exact(expected) => text.to_lowercase() == *expected,
            Matcher::Regex(re) => re.is_match(text),
        }
    }
}

/// Ordered category rules. The first rule in declaration order whose pattern
/// matches its column wins; later matches are ignored.
#[derive(Default)]
pub struct CategoryRuleEngine {
    rules: Vec<CompiledRule>,
    by_name: HashMap<String, usize>,
}

impl CategoryRuleEngine {
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, RuleError> {
        let mut by_name = HashMap::new();
        let compiled = rules
            .into_iter()
            .enumerate()
            .map(|(idx, rule)| -> Result<CompiledRule, RuleError> {
                by_name.entry(rule.name.clone()).or_insert(idx);
                let matcher = match rule.match_type {
                    MatchType::Contains => Matcher::Contains(rule.pattern.to_lowercase()),
                    MatchType::Exact => Matcher::Exact(rule.pattern.to_lowercase()),
                    MatchType::Regex => Matcher::Regex(
                        regex::RegexBuilder::new(&rule.pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|source| RuleError::InvalidPattern {
                                name: rule.name.clone(),
                                source,
                            })?,
                    ),
                };
                Ok(CompiledRule { rule, matcher })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules: compiled,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().map(|cr| &cr.rule)
    }

    pub fn rule(&self, index: usize) -> Option<&CategoryRule> {
        self.rules.get(index).map(|cr| &cr.rule)
    }

    /// Lookup by identifier. With duplicate names the first declared rule is returned.
    pub fn rule_named(&self, name: &str) -> Option<&CategoryRule> {
        self.by_name.get(name).and_then(|&idx| self.rule(idx))
    }

    /// First rule matching the row, with its index. Rules whose column the
    /// row lacks never match.
    pub fn find_match(&self, row: &DataRow) -> Option<(usize, &CategoryRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, cr)| row.field(cr.rule.column).is_some_and(|text| cr.matcher.is_match(text)))
            .map(|(idx, cr)| (idx, &cr.rule))
    }

    /// First rule targeting `column` that matches `text` on its own.
    pub fn find_match_for_value(&self, column: usize, text: &str) -> Option<(usize, &CategoryRule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, cr)| cr.rule.column == column)
            .find(|(_, cr)| cr.matcher.is_match(text))
            .map(|(idx, cr)| (idx, &cr.rule))
    }

    /// Classifies every row in place; returns how many were classified.
    pub fn apply_rules(&self, rows: &mut [DataRow]) -> usize {
        rows.iter_mut()
            .map(|row| {
                self.classify(row);
                row.is_classified()
            })
            .filter(|classified| *classified)
            .count()
    }
}

impl fmt::Debug for CategoryRuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules()).finish()
    }
}

impl RowClassifier for CategoryRuleEngine {
    fn classify(&self, row: &mut DataRow) {
        row.classification = self.find_match(row).map(|(idx, rule)| {
            trace!(rule = %rule.name, category = %rule.category, "row classified");
            Classification {
                category: rule.category,
                rule: rule.name.clone(),
                rule_index: idx,
            }
        });
    }
}
