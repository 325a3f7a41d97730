use crate::profile::{Report, REPORT_COLUMNS};
use crate::transcode::encode_output;
use cntblank_common::{CntblankError, Dialect, Result};
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Html,
    Text,
    Excel,
}

impl OutputFormat {
    /// case-insensitive; anything unknown is written as CSV
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "csv" | "tsv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            "html" => OutputFormat::Html,
            "text" | "txt" => OutputFormat::Text,
            "excel" | "xlsx" => OutputFormat::Excel,
            other => {
                tracing::warn!(format = other, "unknown output format, writing csv");
                OutputFormat::Csv
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Text => "text",
            OutputFormat::Excel => "excel",
        };
        f.write_str(name)
    }
}

/// Writes finished reports somewhere. Renderers never see a report in progress.
pub trait ReportRenderer {
    fn render(&self, reports: &[Report], out: &mut dyn Write) -> Result<()>;
}

pub fn renderer_for(format: OutputFormat, dialect: &Dialect) -> Box<dyn ReportRenderer> {
    match format {
        OutputFormat::Csv => Box::new(CsvRenderer::new(dialect.clone())),
        OutputFormat::Json => Box::new(JsonRenderer),
        OutputFormat::Html => Box::new(HtmlRenderer),
        OutputFormat::Text => Box::new(TextRenderer),
        OutputFormat::Excel => Box::new(ExcelRenderer),
    }
}

fn render_error(e: impl fmt::Display) -> CntblankError {
    CntblankError::Render(e.to_string())
}

// --- delimited text ---

pub struct CsvRenderer {
    dialect: Dialect,
}

impl CsvRenderer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn render_one(&self, report: &Report) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.dialect.delimiter_byte())
            .flexible(true)
            .from_writer(Vec::new());
        if self.dialect.emit_metadata {
            let source = &report.source;
            if let Some(path) = &source.path {
                writer
                    .write_record([
                        "# File",
                        path.as_str(),
                        source.filename.as_deref().unwrap_or(""),
                        source.checksum.as_deref().unwrap_or(""),
                    ])
                    .map_err(render_error)?;
            }
            let fields = report.fields.len().to_string();
            let header = if report.has_header { "(has header)" } else { "" };
            writer
                .write_record(["# Field", fields.as_str(), header, ""])
                .map_err(render_error)?;
            let records = report.records.to_string();
            writer
                .write_record(["# Record", records.as_str(), "", ""])
                .map_err(render_error)?;
        }
        if self.dialect.has_header {
            writer.write_record(REPORT_COLUMNS).map_err(render_error)?;
        }
        for row in report.rows() {
            writer.write_record(&row).map_err(render_error)?;
        }
        let bytes = writer.into_inner().map_err(render_error)?;
        String::from_utf8(bytes).map_err(render_error)
    }
}

impl ReportRenderer for CsvRenderer {
    fn render(&self, reports: &[Report], out: &mut dyn Write) -> Result<()> {
        let mut text = String::new();
        for (i, report) in reports.iter().enumerate() {
            if i > 0 {
                text.push('\n'); // empty record between reports
            }
            text.push_str(&self.render_one(report)?);
        }
        out.write_all(&encode_output(&text, self.dialect.encoding))?;
        Ok(())
    }
}

// --- json ---

pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, reports: &[Report], out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, reports).map_err(render_error)?;
        writeln!(out)?;
        Ok(())
    }
}

// --- html ---

const COUNT_COLUMNS: [usize; 7] = [2, 6, 7, 8, 9, 12, 13];

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct HtmlRenderer;

impl HtmlRenderer {
    fn write_report(&self, report: &Report, out: &mut dyn Write) -> Result<()> {
        let title = report
            .source
            .filename
            .as_deref()
            .unwrap_or("standard input");
        writeln!(out, "<section>")?;
        writeln!(out, "<h2>{}</h2>", escape_html(title))?;
        writeln!(out, "<dl>")?;
        if let Some(path) = &report.source.path {
            writeln!(out, "<dt>Path</dt><dd>{}</dd>", escape_html(path))?;
        }
        if let Some(sum) = &report.source.checksum {
            writeln!(out, "<dt>Checksum</dt><dd>{}</dd>", escape_html(sum))?;
        }
        writeln!(out, "<dt>Fields</dt><dd>{}</dd>", group_thousands(report.fields.len() as u64))?;
        writeln!(out, "<dt>Records</dt><dd>{}</dd>", group_thousands(report.records))?;
        writeln!(out, "</dl>")?;
        writeln!(out, "<table>")?;
        write!(out, "<thead><tr>")?;
        for name in REPORT_COLUMNS {
            write!(out, "<th>{}</th>", escape_html(name))?;
        }
        writeln!(out, "</tr></thead>")?;
        writeln!(out, "<tbody>")?;
        for row in report.rows() {
            write!(out, "<tr>")?;
            for (i, cell) in row.iter().enumerate() {
                let text = match cell.parse::<u64>() {
                    Ok(n) if COUNT_COLUMNS.contains(&i) => group_thousands(n),
                    _ => escape_html(cell),
                };
                if i == 1 {
                    write!(out, "<td>{text}</td>")?;
                } else {
                    write!(out, "<td class=\"num\">{text}</td>")?;
                }
            }
            writeln!(out, "</tr>")?;
        }
        writeln!(out, "</tbody>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</section>")?;
        Ok(())
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, reports: &[Report], out: &mut dyn Write) -> Result<()> {
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(out, "<meta charset=\"utf-8\">")?;
        writeln!(out, "<title>cntblank report</title>")?;
        writeln!(
            out,
            "<style>table{{border-collapse:collapse}}th,td{{border:1px solid #ccc;padding:2px 6px}}td.num{{text-align:right}}</style>"
        )?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        for report in reports {
            self.write_report(report, out)?;
        }
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")?;
        Ok(())
    }
}

// --- plain text ---

/// names flush left, everything else flush right
fn aligned(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == 1 {
                format!("{cell:<w$}")
            } else {
                format!("{cell:>w$}")
            }
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

pub struct TextRenderer;

impl TextRenderer {
    fn write_report(&self, report: &Report, out: &mut dyn Write) -> Result<()> {
        let source = &report.source;
        writeln!(out, "{:<16} {}", "File:", source.path.as_deref().unwrap_or("-"))?;
        if let Some(sum) = &source.checksum {
            writeln!(out, "{:<16} {}", "Checksum:", sum)?;
        }
        writeln!(out, "{:<16} {}", "Header:", if report.has_header { "yes" } else { "no" })?;
        writeln!(out, "{:<16} {}", "Fields:", report.fields.len())?;
        writeln!(out, "{:<16} {}", "Records:", report.records)?;
        writeln!(out)?;

        let rows = report.rows();
        let mut widths: Vec<usize> = REPORT_COLUMNS.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }
        writeln!(out, "{}", aligned(&REPORT_COLUMNS, &widths))?;
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            writeln!(out, "{}", aligned(&cells, &widths))?;
        }
        Ok(())
    }
}

impl ReportRenderer for TextRenderer {
    fn render(&self, reports: &[Report], out: &mut dyn Write) -> Result<()> {
        for (i, report) in reports.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            self.write_report(report, out)?;
        }
        Ok(())
    }
}

// --- spreadsheet ---

pub struct ExcelRenderer;

impl ReportRenderer for ExcelRenderer {
    fn render(&self, _reports: &[Report], _out: &mut dyn Write) -> Result<()> {
        Err(CntblankError::Render(
            "excel output is not supported, use csv, json, html or text".into(),
        ))
    }
}
