pub mod config;
pub mod filter;
pub mod pipeline;
pub mod reader;
pub mod remap;
pub mod rules;
pub mod tokenizer;
pub mod writer;

pub use config::{ConfigError, Profile, ProfileConfig, BUILTIN_PROFILE};
pub use filter::{CombinePolicy, Comparator, ExclusionRule, RowFilter};
pub use pipeline::{
    FileReport, ProcessError, ProcessedStatement, StatementProcessor, StatementSummary,
};
pub use reader::{ByteReader, ReadByte};
pub use remap::{ColumnSource, ContextValue, LayoutError, OutputColumn, OutputLayout};
pub use rules::{CategoryRule, CategoryRuleEngine, MatchType, RowClassifier, RuleError};
pub use tokenizer::{
    tokenize, tokenize_file, Dialect, ParseError, ParsedStatement, ParserState, Termination,
    Tokenizer,
};
pub use writer::{write_statement, write_statement_file, WriteError};
