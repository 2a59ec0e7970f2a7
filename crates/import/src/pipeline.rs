use moneyout_core::{PeriodError, StatementPeriod};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Profile;
use crate::tokenizer::{self, ParseError, ParsedStatement, Termination};
use crate::writer::{self, WriteError};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{0} has no usable file name")]
    FileName(PathBuf),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WriteError,
    },
}

/// Row counts for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementSummary {
    pub headers: usize,
    pub rows_parsed: usize,
    pub classified: usize,
    pub unclassified: usize,
    pub excluded: usize,
    pub written: usize,
    /// Rows whose field count differs from the header count.
    pub ragged: usize,
    /// Set when reading stopped on an I/O error rather than at end of input.
    pub read_error: Option<String>,
    /// Fields of an incomplete trailing row that was left out of the output.
    pub dropped_row: Option<Vec<String>>,
}

/// Output header and rows for one statement, ready to be written.
#[derive(Debug, Clone)]
pub struct ProcessedStatement {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: StatementSummary,
}

/// The outcome of processing one statement file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub period: StatementPeriod,
    #[serde(flatten)]
    pub summary: StatementSummary,
}

/// Orchestrates: tokenize + classify → exclude → remap → write.
pub struct StatementProcessor {
    profile: Profile,
}

impl StatementProcessor {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn process_reader<R: Read>(&self, input: R) -> Result<ProcessedStatement, ParseError> {
        let parsed = tokenizer::tokenize(input, self.profile.dialect, &self.profile.rules)?;
        Ok(self.process_parsed(parsed))
    }

    /// Filters and remaps already tokenized (and classified) rows.
    pub fn process_parsed(&self, parsed: ParsedStatement) -> ProcessedStatement {
        let ParsedStatement {
            headers,
            rows,
            termination,
        } = parsed;

        let classified = rows.iter().filter(|r| r.is_classified()).count();
        let ragged = rows.iter().filter(|r| r.len() != headers.len()).count();
        if ragged > 0 {
            debug!(ragged, headers = headers.len(), "rows with unexpected field count");
        }

        let kept = self.profile.filter.retain(&rows);
        let output_rows: Vec<Vec<String>> = kept
            .iter()
            .map(|row| self.profile.layout.project(row, &self.profile.rules))
            .collect();

        let (read_error, dropped_row) = match termination {
            Termination::Clean => (None, None),
            Termination::TruncatedRow { fields } => (None, Some(fields)),
            Termination::ReadError {
                message,
                partial_row,
            } => (Some(message), partial_row),
        };

        let summary = StatementSummary {
            headers: headers.len(),
            rows_parsed: rows.len(),
            classified,
            unclassified: rows.len() - classified,
            excluded: rows.len() - kept.len(),
            written: output_rows.len(),
            ragged,
            read_error,
            dropped_row,
        };

        ProcessedStatement {
            header: self.profile.layout.header(),
            rows: output_rows,
            summary,
        }
    }

    pub fn render<W: Write>(
        &self,
        statement: &ProcessedStatement,
        out: W,
    ) -> Result<(), WriteError> {
        writer::write_statement(
            out,
            self.profile.dialect.delimiter,
            &statement.header,
            &statement.rows,
        )
    }

    /// Derives the period and output path from the input's file name.
    pub fn output_path(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<(StatementPeriod, PathBuf), ProcessError> {
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ProcessError::FileName(input.to_path_buf()))?;
        let period = StatementPeriod::from_file_name(file_name)?;
        if !period.is_recognised() {
            warn!(
                month = %period.month,
                year = %period.year,
                "{file_name} does not name a recognisable month and year"
            );
        }
        let output = output_dir.join(period.output_file_name());
        Ok((period, output))
    }

    pub fn process_file(&self, input: &Path, output_dir: &Path) -> Result<FileReport, ProcessError> {
        let (period, output) = self.output_path(input, output_dir)?;

        let parsed = tokenizer::tokenize_file(input, self.profile.dialect, &self.profile.rules)?;
        let statement = self.process_parsed(parsed);

        writer::write_statement_file(
            &output,
            self.profile.dialect.delimiter,
            &statement.header,
            &statement.rows,
        )
        .map_err(|source| ProcessError::Write {
            path: output.clone(),
            source,
        })?;

        let summary = statement.summary;
        info!(
            output = %output.display(),
            parsed = summary.rows_parsed,
            classified = summary.classified,
            excluded = summary.excluded,
            written = summary.written,
            "Statement written"
        );

        Ok(FileReport {
            input: input.to_path_buf(),
            output,
            period,
            summary,
        })
    }
}
