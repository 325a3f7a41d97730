use crate::{CntblankError, Result};
use serde::{Deserialize, Serialize};

/// Character encodings a source may be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    #[serde(rename = "sjis")]
    ShiftJis,
}

impl Encoding {
    /// resolve a user-supplied label; `None` means the label is unknown
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "utf8" | "utf-8" => Some(Encoding::Utf8),
            "sjis" | "shift_jis" | "shift-jis" | "cp932" => Some(Encoding::ShiftJis),
            _ => None,
        }
    }

    /// codec used to transcode to/from UTF-8; `None` for UTF-8 itself (bytes pass through)
    pub fn codec(self) -> Option<&'static encoding_rs::Encoding> {
        match self {
            Encoding::Utf8 => None,
            Encoding::ShiftJis => Some(encoding_rs::SHIFT_JIS),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::ShiftJis => "sjis",
        }
    }
}

/// How to read (or write) one tabular file. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    pub delimiter: char,
    pub comment: char,
    /// every row must have as many cells as the first one
    pub strict: bool,
    pub has_header: bool,
    pub encoding: Encoding,
    /// 1-based sheet index for spreadsheets; 0 picks the first sheet
    pub sheet: usize,
    pub emit_metadata: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            comment: '#',
            strict: false,
            has_header: true,
            encoding: Encoding::Utf8,
            sheet: 0,
            emit_metadata: false,
        }
    }
}

impl Dialect {
    /// Builds a dialect from raw option strings.
    ///
    /// The first character of `delimiter` is used (tab when empty). An unknown
    /// encoding is not fatal: it is logged and the input is read as UTF-8.
    pub fn new(delimiter: &str, encoding: &str, has_header: bool) -> Result<Self> {
        let delimiter = delimiter.chars().next().unwrap_or('\t');
        let encoding = Encoding::from_label(encoding).unwrap_or_else(|| {
            tracing::warn!(encoding, "unknown encoding, falling back to utf8");
            Encoding::Utf8
        });
        let dialect = Self {
            delimiter,
            encoding,
            has_header,
            ..Self::default()
        };
        dialect.validate()?;
        Ok(dialect)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_sheet(mut self, sheet: usize) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_metadata(mut self, emit_metadata: bool) -> Self {
        self.emit_metadata = emit_metadata;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(CntblankError::Dialect(format!(
                "delimiter {:?} is not a single-byte character",
                self.delimiter
            )));
        }
        if matches!(self.delimiter, '"' | '\r' | '\n') {
            return Err(CntblankError::Dialect(format!(
                "delimiter {:?} is reserved",
                self.delimiter
            )));
        }
        if !self.comment.is_ascii() {
            return Err(CntblankError::Dialect(format!(
                "comment marker {:?} is not a single-byte character",
                self.comment
            )));
        }
        if self.comment == self.delimiter {
            return Err(CntblankError::Dialect(
                "comment marker and delimiter must differ".into(),
            ));
        }
        Ok(())
    }

    /// delimiter as the byte the csv codec expects; `validate` guarantees ASCII
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn comment_byte(&self) -> u8 {
        self.comment as u8
    }
}
