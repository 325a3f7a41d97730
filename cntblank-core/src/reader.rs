use crate::transcode::decoding_reader;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use cntblank_common::{CntblankError, Dialect, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Row errors tolerated before a source gives up.
pub const MAX_ROW_ERRORS: usize = 100;
const PROGRESS_EVERY: u64 = 1_000_000;
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub type Row = Vec<String>;

enum Origin {
    Delimited {
        reader: csv::Reader<Box<dyn Read>>,
        record: csv::StringRecord,
    },
    Sheet(std::vec::IntoIter<Row>),
    Closed,
}

/// One row-at-a-time view over a delimited text stream or a spreadsheet sheet.
pub struct RecordSource {
    path: Option<PathBuf>,
    origin: Origin,
    rows: u64,
    errors: usize,
    widths: BTreeMap<usize, u64>,
    exhausted: bool,
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_error(path: &Path, reason: impl std::fmt::Display) -> CntblankError {
    CntblankError::Open {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

impl RecordSource {
    /// Open a file. Spreadsheets are chosen by extension and fully loaded here,
    /// so a bad sheet number fails now rather than on the first read.
    pub fn open(path: &Path, dialect: &Dialect) -> Result<Self> {
        dialect.validate()?;
        let meta = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
        if meta.is_dir() {
            return Err(open_error(path, "is a directory"));
        }
        let origin = if is_spreadsheet(path) {
            Origin::Sheet(read_sheet(path, dialect.sheet)?.into_iter())
        } else {
            let file = File::open(path).map_err(|e| open_error(path, e))?;
            delimited(decoding_reader(file, dialect.encoding), dialect)
        };
        Ok(Self::with_origin(Some(path.to_path_buf()), origin))
    }

    /// delimited text from any byte stream (stdin, in-memory buffers)
    pub fn from_reader<R: Read + 'static>(reader: R, dialect: &Dialect) -> Result<Self> {
        dialect.validate()?;
        let origin = delimited(decoding_reader(reader, dialect.encoding), dialect);
        Ok(Self::with_origin(None, origin))
    }

    /// an already materialized row matrix
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::with_origin(None, Origin::Sheet(rows.into_iter()))
    }

    fn with_origin(path: Option<PathBuf>, origin: Origin) -> Self {
        Self {
            path,
            origin,
            rows: 0,
            errors: 0,
            widths: BTreeMap::new(),
            exhausted: false,
        }
    }

    /// `Ok(None)` is end of data. A `RowParse` error means that row was skipped
    /// and the caller should keep reading; `TooManyErrors` is permanent.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.errors > MAX_ROW_ERRORS {
            return Err(CntblankError::TooManyErrors { count: self.errors });
        }
        let next = match &mut self.origin {
            Origin::Closed => Ok(None),
            Origin::Sheet(rows) => Ok(rows.next()),
            Origin::Delimited { reader, record } => reader
                .read_record(record)
                .map(|more| more.then(|| record.iter().map(str::to_owned).collect())),
        };
        match next {
            Ok(Some(row)) => {
                self.rows += 1;
                *self.widths.entry(row.len()).or_insert(0) += 1;
                if self.rows % PROGRESS_EVERY == 0 {
                    tracing::info!(path = ?self.path, "==> processed {} lines <==", self.rows);
                }
                Ok(Some(row))
            }
            Ok(None) => {
                if !self.exhausted {
                    self.exhausted = true;
                    self.log_summary();
                }
                Ok(None)
            }
            Err(e) => {
                self.errors += 1;
                let line = e.position().map(|p| p.line()).unwrap_or(self.rows + 1);
                tracing::error!(path = ?self.path, line, error = %e, "cannot parse row");
                if self.errors > MAX_ROW_ERRORS {
                    tracing::error!(path = ?self.path, "too many error lines");
                    return Err(CntblankError::TooManyErrors { count: self.errors });
                }
                Err(CntblankError::RowParse {
                    line,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn log_summary(&self) {
        tracing::info!(
            path = ?self.path,
            "finish parsing {} lines with {} errors",
            self.rows,
            self.errors
        );
        for (width, count) in &self.widths {
            tracing::info!(path = ?self.path, "  column size {width} has {count} lines");
        }
    }

    /// Release the underlying handle. Safe to call more than once.
    pub fn close(&mut self) {
        self.origin = Origin::Closed;
        self.exhausted = true;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rows_read(&self) -> u64 {
        self.rows
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// how many rows were seen at each column count
    pub fn row_widths(&self) -> &BTreeMap<usize, u64> {
        &self.widths
    }
}

fn delimited(reader: Box<dyn Read>, dialect: &Dialect) -> Origin {
    let reader = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter_byte())
        .comment(Some(dialect.comment_byte()))
        .flexible(!dialect.strict)
        .has_headers(false)
        .from_reader(reader);
    Origin::Delimited {
        reader,
        record: csv::StringRecord::new(),
    }
}

/// map a 1-based sheet number (0 = first) onto a sheet index
fn sheet_index(count: usize, sheet: usize) -> std::result::Result<usize, String> {
    if count == 0 {
        return Err("workbook has no sheets".into());
    }
    match sheet {
        0 => Ok(0),
        n if n > count => Err(format!(
            "has only {count} sheets, given sheet number is {n}"
        )),
        n => Ok(n - 1),
    }
}

fn read_sheet(path: &Path, sheet: usize) -> Result<Vec<Row>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| open_error(path, e))?;
    let index = sheet_index(workbook.sheet_names().len(), sheet).map_err(|r| open_error(path, r))?;
    let range = workbook
        .worksheet_range_at(index)
        .ok_or_else(|| open_error(path, format!("sheet {} not found", index + 1)))?
        .map_err(|e| open_error(path, e))?;
    let mut rows: Vec<Row> = range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();
    // an empty trailing row is not a record
    while rows
        .last()
        .is_some_and(|r| r.iter().all(|c| c.is_empty()))
    {
        rows.pop();
    }
    tracing::debug!(path = %path.display(), sheet = index + 1, rows = rows.len(), "loaded sheet");
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
