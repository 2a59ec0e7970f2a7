use anyhow::{Context, Result};
use moneyout_import::{FileReport, Profile, StatementProcessor};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Cli;

#[derive(Debug, Serialize)]
pub struct SkippedFile {
    pub input: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Totals {
    pub rows_parsed: usize,
    pub classified: usize,
    pub unclassified: usize,
    pub excluded: usize,
    pub written: usize,
    pub dropped_rows: usize,
    pub read_errors: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    pub totals: Totals,
}

impl RunSummary {
    fn record(&mut self, report: FileReport) {
        let s = &report.summary;
        self.totals.rows_parsed += s.rows_parsed;
        self.totals.classified += s.classified;
        self.totals.unclassified += s.unclassified;
        self.totals.excluded += s.excluded;
        self.totals.written += s.written;
        self.totals.dropped_rows += usize::from(s.dropped_row.is_some());
        self.totals.read_errors += usize::from(s.read_error.is_some());
        self.files.push(report);
    }
}

pub fn load_profile(config: Option<&Path>) -> Result<Profile> {
    match config {
        Some(path) => Profile::from_path(path)
            .with_context(|| format!("Failed to load profile {}", path.display())),
        None => Profile::builtin().context("Built-in profile is invalid"),
    }
}

/// Regular files in `dir`, sorted by name so runs are repeatable.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Unable to scan directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Unable to scan directory {}", dir.display()))?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn run(cli: &Cli) -> Result<RunSummary> {
    let processor = StatementProcessor::new(load_profile(cli.config.as_deref())?);
    let inputs = discover_inputs(&cli.input_dir)?;
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    let mut summary = RunSummary::default();
    let mut written_by: HashMap<PathBuf, PathBuf> = HashMap::new();

    for input in inputs {
        tracing::info!("Processing {}", input.display());
        match processor.process_file(&input, &cli.output_dir) {
            Ok(report) => {
                if let Some(previous) = written_by.insert(report.output.clone(), input.clone()) {
                    tracing::warn!(
                        "{} replaced output {} from {}",
                        input.display(),
                        report.output.display(),
                        previous.display()
                    );
                }
                summary.record(report);
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", input.display());
                summary.skipped.push(SkippedFile {
                    input,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}
