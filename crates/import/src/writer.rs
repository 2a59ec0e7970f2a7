use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes a header line and data lines. Fields are joined with the delimiter
/// and never quoted, so a value containing the delimiter shifts later columns.
pub fn write_statement<W: Write, I>(
    mut out: W,
    delimiter: u8,
    header: &[String],
    rows: I,
) -> Result<(), WriteError>
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'));

    let mut writer = builder.from_writer(&mut out);
    for (line, record) in std::iter::once(Line::Header(header))
        .chain(rows.into_iter().map(Line::Row))
        .enumerate()
    {
        let record = record.fields();
        if is_zero_bytes(record) {
            // csv writes a zero-byte record as `""`; emit the bare terminator instead.
            trace!(line, "writing empty line");
            writer.flush()?;
            drop(writer);
            out.write_all(b"\n")?;
            writer = builder.from_writer(&mut out);
        } else {
            writer.write_record(record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

enum Line<'h, R> {
    Header(&'h [String]),
    Row(R),
}

impl<R: AsRef<[String]>> Line<'_, R> {
    fn fields(&self) -> &[String] {
        match self {
            Line::Header(fields) => *fields,
            Line::Row(row) => row.as_ref(),
        }
    }
}

fn is_zero_bytes(record: &[String]) -> bool {
    matches!(record, [] | [_]) && record.iter().all(String::is_empty)
}

/// Replaces whatever is at `path` with a freshly written statement.
pub fn write_statement_file<I>(
    path: &Path,
    delimiter: u8,
    header: &[String],
    rows: I,
) -> Result<(), WriteError>
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    if path.exists() {
        debug!("Removing existing output {}", path.display());
        fs::remove_file(path)?;
    }
    let file = File::create(path)?;
    write_statement(BufWriter::new(file), delimiter, header, rows)
}
