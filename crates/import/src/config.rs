use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::filter::{CombinePolicy, ExclusionRule, RowFilter};
use crate::remap::{LayoutError, OutputColumn, OutputLayout};
use crate::rules::{CategoryRule, CategoryRuleEngine, RuleError};
use crate::tokenizer::Dialect;

/// Profile reproducing the statement layout the tool was first written for.
pub const BUILTIN_PROFILE: &str = include_str!("../profiles/default.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse profile: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid dialect: {0}")]
    Dialect(String),
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error("Invalid output layout: {0}")]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    pub delimiter: String,
    pub terminator: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            terminator: "\n".to_string(),
        }
    }
}

impl DialectConfig {
    pub fn to_dialect(&self) -> Result<Dialect, ConfigError> {
        let delimiter = single_byte("delimiter", &self.delimiter)?;
        let terminator = single_byte("terminator", &self.terminator)?;
        if delimiter == terminator {
            return Err(ConfigError::Dialect(
                "delimiter and terminator must differ".to_string(),
            ));
        }
        Ok(Dialect {
            delimiter,
            terminator,
        })
    }
}

fn single_byte(what: &str, s: &str) -> Result<u8, ConfigError> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => Err(ConfigError::Dialect(format!(
            "{what} must be a single byte, got {s:?}"
        ))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub combine: CombinePolicy,
    #[serde(default)]
    pub exclude: Vec<ExclusionRule>,
}

/// On-disk shape of a processing profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default)]
    pub dialect: DialectConfig,
    #[serde(default)]
    pub rules: Vec<CategoryRule>,
    #[serde(default)]
    pub filter: FilterConfig,
    pub columns: Vec<OutputColumn>,
}

/// A validated, immutable profile ready to drive the processor.
#[derive(Debug)]
pub struct Profile {
    pub dialect: Dialect,
    pub rules: CategoryRuleEngine,
    pub filter: RowFilter,
    pub layout: OutputLayout,
}

impl Profile {
    pub fn from_config(config: ProfileConfig) -> Result<Self, ConfigError> {
        let rules = CategoryRuleEngine::new(config.rules)?;
        if rules.is_empty() {
            warn!("Profile has no category rules; every row will be unclassified");
        }
        Ok(Self {
            dialect: config.dialect.to_dialect()?,
            rules,
            filter: RowFilter::new(config.filter.exclude, config.filter.combine),
            layout: OutputLayout::new(config.columns)?,
        })
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ProfileConfig = toml::from_str(toml_content)?;
        Self::from_config(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_PROFILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Comparator;
    use crate::remap::{ColumnSource, ContextValue};
    use crate::rules::MatchType;
    use moneyout_core::{CategoryCode, Money};

    #[test]
    fn builtin_profile_loads() {
        let profile = Profile::builtin().unwrap();
        assert_eq!(profile.dialect, Dialect::default());
        assert_eq!(profile.rules.len(), 15);
        assert_eq!(profile.layout.width(), 19);
        assert_eq!(profile.filter.policy(), CombinePolicy::Any);
    }

    #[test]
    fn builtin_rules_keep_declaration_order() {
        let profile = Profile::builtin().unwrap();
        let first = profile.rules.rule(0).unwrap();
        assert_eq!(first.name, "amazon");
        assert_eq!(first.match_type, MatchType::Regex);
        assert_eq!(first.comment.as_deref(), Some("computer equipment"));
        let tax = profile.rules.rule_named("corporation_tax").unwrap();
        assert_eq!(tax.category, CategoryCode::CORPORATION_TAX);
        assert!(tax.comment.is_none());
    }

    #[test]
    fn builtin_layout_columns() {
        let profile = Profile::builtin().unwrap();
        let columns = profile.layout.columns();
        assert_eq!(columns[17].name, "COMMENTS");
        assert_eq!(
            columns[17].source,
            ColumnSource::Gated { category: CategoryCode::OTHER, column: None }
        );
        assert_eq!(
            columns[18].source,
            ColumnSource::Context { value: ContextValue::Category }
        );
    }

    const MINIMAL: &str = r#"
[[filter.exclude]]
column = 2
comparator = "le"
threshold = "-10.5"

[[columns]]
name = "A"
index = 0
source = { kind = "input", column = 0 }
"#;

    #[test]
    fn minimal_profile_uses_defaults() {
        let config: ProfileConfig = toml::from_str(MINIMAL).unwrap();
        assert!(config.rules.is_empty());
        assert_eq!(config.filter.exclude[0].comparator, Comparator::Le);
        assert_eq!(config.filter.exclude[0].threshold, Money::parse("-10.5").unwrap());
        assert!(Profile::from_config(config).unwrap().rules.is_empty());
    }

    #[test]
    fn unknown_comparator_is_fatal() {
        let bad = MINIMAL.replace("\"le\"", "\"between\"");
        assert!(matches!(Profile::from_toml(&bad), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn layout_gap_is_fatal() {
        let bad = MINIMAL.replace("index = 0", "index = 1");
        assert!(matches!(
            Profile::from_toml(&bad),
            Err(ConfigError::Layout(LayoutError::Gap { index: 0 }))
        ));
    }

    #[test]
    fn multi_byte_delimiter_is_rejected() {
        let bad = format!("[dialect]\ndelimiter = \"::\"\n{MINIMAL}");
        assert!(matches!(Profile::from_toml(&bad), Err(ConfigError::Dialect(_))));
    }

    #[test]
    fn unknown_category_name_is_rejected() {
        let bad = format!(
            "[[rules]]\nname = \"x\"\ncolumn = 1\npattern = \"x\"\ncategory = \"groceries\"\n{MINIMAL}"
        );
        assert!(matches!(Profile::from_toml(&bad), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Profile::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
