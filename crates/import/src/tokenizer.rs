use moneyout_core::DataRow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::reader::{ByteReader, ReadByte};
use crate::rules::RowClassifier;

/// Field delimiter and line terminator, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub terminator: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            terminator: b'\n',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    StartFile,
    HeaderRowStart,
    HeaderRowRead,
    HeaderRowEnd,
    DataRowStart,
    DataRowRead,
    DataRowEnd,
    Delimiter,
    EndOfLine,
    EndOfFile,
}

/// How the input ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Termination {
    /// Input ended on a row boundary.
    #[default]
    Clean,
    /// Input ended part-way through a data row; the partial row was dropped.
    TruncatedRow { fields: Vec<String> },
    /// A read failed while reading data rows. `partial_row` holds the fields
    /// of the row that was dropped, or `None` when the failure fell between rows.
    ReadError {
        message: String,
        partial_row: Option<Vec<String>>,
    },
}

impl Termination {
    pub fn dropped_row(&self) -> Option<&[String]> {
        match self {
            Termination::Clean => None,
            Termination::TruncatedRow { fields } => Some(fields),
            Termination::ReadError { partial_row, .. } => partial_row.as_deref(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Read error in header row at byte {offset}: {source}")]
    HeaderRead {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("Tokenizer entered {state:?} after {previous:?}")]
    UnexpectedState {
        state: ParserState,
        previous: ParserState,
    },
}

/// Everything the tokenizer produced from one input.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub headers: Vec<String>,
    pub rows: Vec<DataRow>,
    pub termination: Termination,
}

/// Mutable parse state for one input, owned by its `Tokenizer`.
#[derive(Debug)]
pub struct ParseContext {
    pub state: ParserState,
    pub previous: ParserState,
    buffer: Vec<u8>,
    headers: Vec<String>,
    rows: Vec<DataRow>,
    termination: Termination,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            state: ParserState::StartFile,
            previous: ParserState::StartFile,
            buffer: Vec::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            termination: Termination::Clean,
        }
    }

    /// Empties the field buffer. Bytes that are not UTF-8 become U+FFFD.
    fn take_field(&mut self, offset: u64) -> String {
        let bytes = std::mem::take(&mut self.buffer);
        String::from_utf8(bytes).unwrap_or_else(|e| {
            let field = String::from_utf8_lossy(e.as_bytes()).into_owned();
            warn!(offset, field = %field, "field is not valid UTF-8, invalid bytes replaced");
            field
        })
    }

    /// Removes the in-progress row, returning its fields plus any buffered text.
    fn abandon_row(&mut self, offset: u64) -> Vec<String> {
        let mut fields = self.rows.pop().map(|row| row.fields).unwrap_or_default();
        if !self.buffer.is_empty() {
            fields.push(self.take_field(offset));
        }
        fields
    }
}

/// Byte-at-a-time state machine splitting delimited text into a header row
/// and data rows. Each data row is classified as soon as its line ends.
pub struct Tokenizer<'c, R, C: ?Sized> {
    reader: ByteReader<R>,
    dialect: Dialect,
    classifier: &'c C,
    ctx: ParseContext,
}

impl<'c, R: Read, C: RowClassifier + ?Sized> Tokenizer<'c, R, C> {
    pub fn new(input: R, dialect: Dialect, classifier: &'c C) -> Self {
        Self {
            reader: ByteReader::new(input),
            dialect,
            classifier,
            ctx: ParseContext::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.ctx.state
    }

    pub fn is_finished(&self) -> bool {
        self.ctx.state == ParserState::EndOfFile
    }

    /// Runs one transition.
    pub fn step(&mut self) -> Result<(), ParseError> {
        use ParserState::*;

        let next = match self.ctx.state {
            StartFile => HeaderRowStart,
            HeaderRowStart => self.header_row_start()?,
            HeaderRowRead => self.header_row_read()?,
            HeaderRowEnd => DataRowStart,
            DataRowStart => self.data_row_start(),
            DataRowRead => self.data_row_read(),
            DataRowEnd => DataRowStart,
            Delimiter => self.delimiter()?,
            EndOfLine => self.end_of_line()?,
            EndOfFile => EndOfFile,
        };
        trace!(from = ?self.ctx.state, to = ?next, offset = self.reader.offset(), "transition");
        self.ctx.state = next;
        Ok(())
    }

    pub fn run(mut self) -> Result<ParsedStatement, ParseError> {
        while !self.is_finished() {
            self.step()?;
        }
        let ctx = self.ctx;
        Ok(ParsedStatement {
            headers: ctx.headers,
            rows: ctx.rows,
            termination: ctx.termination,
        })
    }

    fn read_header_byte(&mut self) -> Result<ReadByte, ParseError> {
        let offset = self.reader.offset();
        self.reader
            .read_byte()
            .map_err(|source| ParseError::HeaderRead { offset, source })
    }

    fn header_row_start(&mut self) -> Result<ParserState, ParseError> {
        let next = match self.read_header_byte()? {
            ReadByte::EndOfInput => ParserState::EndOfFile,
            ReadByte::Byte(b) if b == self.dialect.delimiter => {
                self.ctx.previous = ParserState::HeaderRowStart;
                ParserState::Delimiter
            }
            ReadByte::Byte(b) if b == self.dialect.terminator => {
                self.ctx.previous = ParserState::HeaderRowStart;
                ParserState::EndOfLine
            }
            ReadByte::Byte(b) => {
                self.ctx.buffer.push(b);
                ParserState::HeaderRowRead
            }
        };
        Ok(next)
    }

    fn header_row_read(&mut self) -> Result<ParserState, ParseError> {
        let next = match self.read_header_byte()? {
            ReadByte::EndOfInput => {
                // A header-only file without a final terminator.
                let field = self.ctx.take_field(self.reader.offset());
                self.ctx.headers.push(field);
                ParserState::EndOfFile
            }
            ReadByte::Byte(b) if b == self.dialect.delimiter => {
                self.ctx.previous = ParserState::HeaderRowRead;
                ParserState::Delimiter
            }
            ReadByte::Byte(b) if b == self.dialect.terminator => {
                self.ctx.previous = ParserState::HeaderRowRead;
                ParserState::EndOfLine
            }
            ReadByte::Byte(b) => {
                self.ctx.buffer.push(b);
                ParserState::HeaderRowRead
            }
        };
        Ok(next)
    }

    fn data_row_start(&mut self) -> ParserState {
        match self.reader.read_byte() {
            Err(e) => {
                warn!(offset = self.reader.offset(), "read error between rows: {e}");
                self.ctx.termination = Termination::ReadError {
                    message: e.to_string(),
                    partial_row: None,
                };
                ParserState::EndOfFile
            }
            Ok(ReadByte::EndOfInput) => ParserState::EndOfFile,
            Ok(ReadByte::Byte(b)) if b == self.dialect.terminator => {
                debug!(offset = self.reader.offset(), "skipping blank line");
                ParserState::DataRowEnd
            }
            Ok(ReadByte::Byte(b)) => {
                self.ctx.rows.push(DataRow::new());
                if b == self.dialect.delimiter {
                    self.ctx.previous = ParserState::DataRowStart;
                    ParserState::Delimiter
                } else {
                    self.ctx.buffer.push(b);
                    ParserState::DataRowRead
                }
            }
        }
    }

    fn data_row_read(&mut self) -> ParserState {
        match self.reader.read_byte() {
            Err(e) => {
                let fields = self.ctx.abandon_row(self.reader.offset());
                warn!(
                    offset = self.reader.offset(),
                    dropped_fields = fields.len(),
                    "read error mid-row, dropping row: {e}"
                );
                self.ctx.termination = Termination::ReadError {
                    message: e.to_string(),
                    partial_row: Some(fields),
                };
                ParserState::EndOfFile
            }
            Ok(ReadByte::EndOfInput) => {
                let fields = self.ctx.abandon_row(self.reader.offset());
                warn!(
                    dropped_fields = fields.len(),
                    "input ended mid-row, dropping unterminated last row"
                );
                self.ctx.termination = Termination::TruncatedRow { fields };
                ParserState::EndOfFile
            }
            Ok(ReadByte::Byte(b)) if b == self.dialect.delimiter => {
                self.ctx.previous = ParserState::DataRowRead;
                ParserState::Delimiter
            }
            Ok(ReadByte::Byte(b)) if b == self.dialect.terminator => {
                self.ctx.previous = ParserState::DataRowRead;
                ParserState::EndOfLine
            }
            Ok(ReadByte::Byte(b)) => {
                self.ctx.buffer.push(b);
                ParserState::DataRowRead
            }
        }
    }

    fn current_row(&mut self) -> Result<&mut DataRow, ParseError> {
        let (state, previous) = (self.ctx.state, self.ctx.previous);
        self.ctx
            .rows
            .last_mut()
            .ok_or(ParseError::UnexpectedState { state, previous })
    }

    /// Flushes the buffered field and resumes reading the same row.
    fn delimiter(&mut self) -> Result<ParserState, ParseError> {
        let field = self.ctx.take_field(self.reader.offset());
        match self.ctx.previous {
            ParserState::HeaderRowStart | ParserState::HeaderRowRead => {
                self.ctx.headers.push(field);
                Ok(ParserState::HeaderRowRead)
            }
            ParserState::DataRowStart | ParserState::DataRowRead => {
                self.current_row()?.push_field(field);
                Ok(ParserState::DataRowRead)
            }
            previous => Err(ParseError::UnexpectedState {
                state: ParserState::Delimiter,
                previous,
            }),
        }
    }

    /// Flushes the final field of the row; data rows are classified here.
    fn end_of_line(&mut self) -> Result<ParserState, ParseError> {
        let field = self.ctx.take_field(self.reader.offset());
        match self.ctx.previous {
            ParserState::HeaderRowStart | ParserState::HeaderRowRead => {
                self.ctx.headers.push(field);
                debug!(headers = self.ctx.headers.len(), "header row complete");
                Ok(ParserState::HeaderRowEnd)
            }
            ParserState::DataRowStart | ParserState::DataRowRead => {
                let classifier = self.classifier;
                let row = self.current_row()?;
                row.push_field(field);
                classifier.classify(row);
                Ok(ParserState::DataRowEnd)
            }
            previous => Err(ParseError::UnexpectedState {
                state: ParserState::EndOfLine,
                previous,
            }),
        }
    }
}

/// Tokenizes (and classifies) everything readable from `input`.
pub fn tokenize<R: Read, C: RowClassifier + ?Sized>(
    input: R,
    dialect: Dialect,
    classifier: &C,
) -> Result<ParsedStatement, ParseError> {
    Tokenizer::new(input, dialect, classifier).run()
}

/// Opens `path` for the duration of the parse; the handle is closed on every exit path.
pub fn tokenize_file<C: RowClassifier + ?Sized>(
    path: &Path,
    dialect: Dialect,
    classifier: &C,
) -> Result<ParsedStatement, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    tokenize(file, dialect, classifier)
}
