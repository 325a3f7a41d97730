use crate::profile::{Profiler, Report};
use crate::reader::RecordSource;
use crate::scanner::SourceFile;
use cntblank_common::{Dialect, Result, SourceInfo};
use std::io::Read;
use std::path::Path;

/// Drain `source` through a fresh profiler. Malformed rows are skipped;
/// any other error ends the run for this source.
pub fn profile_source(source: &mut RecordSource, has_header: bool, info: SourceInfo) -> Result<Report> {
    let mut profiler = Profiler::new(has_header, info);
    if !has_header {
        tracing::info!("start parsing without header row");
    }
    loop {
        let row = match source.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) if e.is_recoverable() => continue,
            Err(e) => return Err(e),
        };
        let blanks = profiler.consume(&row)?;
        if blanks > 0 {
            tracing::debug!(
                "line #{} has {} fields with {} blank(s)",
                source.rows_read(),
                row.len(),
                blanks
            );
        }
    }
    profiler.finish()
}

pub fn profile_path(path: &Path, dialect: &Dialect) -> Result<Report> {
    tracing::info!(path = %path.display(), "open file");
    let mut source = RecordSource::open(path, dialect)?;
    let result = profile_source(&mut source, dialect.has_header, SourceInfo::from_path(path));
    source.close();
    result
}

/// Profile delimited text from any stream, e.g. standard input.
pub fn profile_reader<R: Read + 'static>(reader: R, dialect: &Dialect) -> Result<Report> {
    let mut source = RecordSource::from_reader(reader, dialect)?;
    let result = profile_source(&mut source, dialect.has_header, SourceInfo::default());
    source.close();
    result
}

/// One report per file that could be profiled, in input order.
pub fn profile_files(files: &[SourceFile], dialect: &Dialect) -> Vec<Report> {
    let mut reports = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let mut report = match profile_path(&file.path, dialect) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("[{}] error while processing {}: {}", i + 1, file.path.display(), e);
                continue;
            }
        };
        match file.checksum() {
            Ok(sum) => report.source.checksum = Some(sum),
            Err(e) => tracing::warn!(path = %file.path.display(), error = %e, "cannot checksum file"),
        }
        reports.push(report);
    }
    reports
}
