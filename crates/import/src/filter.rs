use moneyout_core::{DataRow, Money};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Gt,
    #[serde(alias = "gte")]
    Ge,
    Lt,
    #[serde(alias = "lte")]
    Le,
    Eq,
    Ne,
}

impl Comparator {
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
        }
    }
}

impl std::str::FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gt" => Ok(Comparator::Gt),
            "ge" | "gte" => Ok(Comparator::Ge),
            "lt" => Ok(Comparator::Lt),
            "le" | "lte" => Ok(Comparator::Le),
            "eq" => Ok(Comparator::Eq),
            "ne" => Ok(Comparator::Ne),
            other => Err(format!("Unknown comparator: '{other}'")),
        }
    }
}

/// Drops a row when its column, read as an amount, compares against the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub column: usize,
    pub comparator: Comparator,
    pub threshold: Money,
}

impl ExclusionRule {
    /// Missing, empty, or non-numeric values never satisfy the comparator.
    pub fn matches(&self, row: &DataRow) -> bool {
        row.field(self.column)
            .and_then(|value| Money::parse(value).ok())
            .is_some_and(|amount| self.comparator.holds(amount.cmp(&self.threshold)))
    }
}

/// How several exclusion rules combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinePolicy {
    /// Excluded when any rule matches.
    #[default]
    Any,
    /// Excluded only when every rule matches.
    All,
}

#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    rules: Vec<ExclusionRule>,
    policy: CombinePolicy,
}

impl RowFilter {
    pub fn new(rules: Vec<ExclusionRule>, policy: CombinePolicy) -> Self {
        Self { rules, policy }
    }

    pub fn policy(&self) -> CombinePolicy {
        self.policy
    }

    /// With no rules nothing is excluded, whatever the policy.
    pub fn excludes(&self, row: &DataRow) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        match self.policy {
            CombinePolicy::Any => self.rules.iter().any(|rule| rule.matches(row)),
            CombinePolicy::All => self.rules.iter().all(|rule| rule.matches(row)),
        }
    }

    /// Rows that survive the filter, in input order.
    pub fn retain<'a>(&self, rows: &'a [DataRow]) -> Vec<&'a DataRow> {
        rows.iter()
            .filter(|row| {
                let excluded = self.excludes(row);
                if excluded {
                    debug!(fields = ?row.fields, "row excluded");
                }
                !excluded
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IN: usize = 3;
    const OUT: usize = 4;

    fn row(inflow: &str, outflow: &str) -> DataRow {
        DataRow::from_fields(["2022-08-01", "DETAILS", "DEB", inflow, outflow, "100.00"])
    }

    fn rule(column: usize, comparator: Comparator, threshold: &str) -> ExclusionRule {
        ExclusionRule {
            column,
            comparator,
            threshold: Money::parse(threshold).unwrap(),
        }
    }

    fn inflow_filter() -> RowFilter {
        RowFilter::new(vec![rule(IN, Comparator::Gt, "0")], CombinePolicy::Any)
    }

    #[test]
    fn positive_inflow_is_excluded() {
        assert!(inflow_filter().excludes(&row("50.00", "0")));
    }

    #[test]
    fn empty_or_zero_inflow_is_kept() {
        let filter = inflow_filter();
        assert!(!filter.excludes(&row("", "45.00")));
        assert!(!filter.excludes(&row("0.00", "45.00")));
    }

    #[test]
    fn non_numeric_and_missing_values_never_match() {
        let filter = inflow_filter();
        assert!(!filter.excludes(&row("n/a", "1")));
        assert!(!filter.excludes(&DataRow::from_fields(["2022-08-01"])));
    }

    #[test]
    fn comparator_semantics() {
        use Ordering::*;
        assert!(Comparator::Ge.holds(Equal) && Comparator::Ge.holds(Greater) && !Comparator::Ge.holds(Less));
        assert!(Comparator::Le.holds(Equal) && !Comparator::Le.holds(Greater));
        assert!(Comparator::Ne.holds(Less) && !Comparator::Ne.holds(Equal));
        assert!(Comparator::Eq.holds(Equal) && !Comparator::Lt.holds(Equal));
    }

    #[test]
    fn any_policy_is_or() {
        let filter = RowFilter::new(
            vec![rule(IN, Comparator::Gt, "0"), rule(OUT, Comparator::Gt, "1000")],
            CombinePolicy::Any,
        );
        assert!(filter.excludes(&row("", "5000")));
        assert!(filter.excludes(&row("1", "5")));
        assert!(!filter.excludes(&row("", "5")));
    }

    #[test]
    fn all_policy_is_and() {
        let filter = RowFilter::new(
            vec![rule(IN, Comparator::Gt, "0"), rule(OUT, Comparator::Gt, "1000")],
            CombinePolicy::All,
        );
        assert!(!filter.excludes(&row("", "5000")));
        assert!(!filter.excludes(&row("1", "5")));
        assert!(filter.excludes(&row("1", "5000")));
    }

    #[test]
    fn no_rules_excludes_nothing() {
        let filter = RowFilter::new(vec![], CombinePolicy::All);
        assert!(!filter.excludes(&row("50", "0")));
    }

    #[test]
    fn retain_preserves_order() {
        let rows = vec![row("", "1"), row("50.00", "0"), row("", "2")];
        let kept = inflow_filter().retain(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].field(OUT), Some("1"));
        assert_eq!(kept[1].field(OUT), Some("2"));
    }

    #[test]
    fn comparator_parsing() {
        assert_eq!("GTE".parse::<Comparator>().unwrap(), Comparator::Ge);
        assert!("between".parse::<Comparator>().is_err());
    }
}
