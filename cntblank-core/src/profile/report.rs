use super::field::{column_name, Field};
use cntblank_common::{CntblankError, Result, SourceInfo};
use serde::Serialize;

/// Everything learned about one source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub source: SourceInfo,
    #[serde(rename = "header")]
    pub has_header: bool,
    pub records: u64,
    pub fields: Vec<Field>,
}

impl Report {
    pub fn new(source: SourceInfo) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Name one field per header cell.
    pub fn consume_header(&mut self, row: &[String]) -> Result<()> {
        if row.is_empty() {
            return Err(CntblankError::EmptyHeader);
        }
        self.has_header = true;
        self.fields = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name: String = cell.trim().chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
                if name.is_empty() {
                    Field::new(i + 1, column_name(i + 1))
                } else {
                    Field::new(i + 1, name)
                }
            })
            .collect();
        Ok(())
    }

    /// Fold one data row. Returns how many of its cells were blank.
    pub fn consume_record(&mut self, row: &[String]) -> usize {
        let prior = self.records;
        self.records += 1;
        for i in self.fields.len()..row.len() {
            self.fields.push(Field::backfilled(i + 1, prior));
        }
        let mut blanks = 0;
        for (cell, field) in row.iter().zip(self.fields.iter_mut()) {
            if field.fold(cell) {
                blanks += 1;
            }
        }
        blanks
    }

    /// display rows, one per field, in column order
    pub fn rows(&self) -> Vec<[String; 14]> {
        self.fields.iter().map(|f| f.format(self.records)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerState {
    AwaitingHeader,
    Accumulating,
}

/// Turns a row stream into a [`Report`], one row at a time.
pub struct Profiler {
    state: ProfilerState,
    report: Report,
}

impl Profiler {
    pub fn new(has_header: bool, source: SourceInfo) -> Self {
        let state = if has_header {
            ProfilerState::AwaitingHeader
        } else {
            ProfilerState::Accumulating
        };
        Self {
            state,
            report: Report::new(source),
        }
    }

    pub fn state(&self) -> ProfilerState {
        self.state
    }

    /// Feed the next row: the header while one is expected, data afterwards.
    /// Returns the blank cell count of a data row (0 for the header).
    pub fn consume(&mut self, row: &[String]) -> Result<usize> {
        match self.state {
            ProfilerState::AwaitingHeader => {
                self.report.consume_header(row)?;
                self.state = ProfilerState::Accumulating;
                tracing::info!("start parsing with {} columns", self.report.fields.len());
                Ok(0)
            }
            ProfilerState::Accumulating => Ok(self.report.consume_record(row)),
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// A header was expected but the source ended first.
    pub fn finish(self) -> Result<Report> {
        match self.state {
            ProfilerState::AwaitingHeader => Err(CntblankError::EmptySource),
            ProfilerState::Accumulating => Ok(self.report),
        }
    }
}
