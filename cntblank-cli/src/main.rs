use anyhow::{bail, Context};
use clap::Parser;
use cntblank_common::Config;
use cntblank_core::{
    collect_files, profile_files, profile_reader, renderer_for, Dialect, OutputFormat, Report,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cntblank", version, about = "Count blank cells and guess column types in tabular files")]
struct Cli {
    /// files, directories or glob patterns; standard input when omitted
    tabfile: Vec<String>,
    #[arg(short, long)]
    verbose: bool,
    #[arg(short = 'e', long)]
    input_encoding: Option<String>,
    #[arg(short = 'E', long)]
    output_encoding: Option<String>,
    #[arg(long)]
    input_delimiter: Option<String>,
    #[arg(long)]
    output_delimiter: Option<String>,
    /// treat the first row as data
    #[arg(long)]
    without_header: bool,
    #[arg(long)]
    output_without_header: bool,
    /// skip rows whose column count differs from the first row
    #[arg(long)]
    strict: bool,
    /// 1-based sheet number for spreadsheets
    #[arg(long)]
    sheet: Option<usize>,
    #[arg(short, long)]
    recursive: bool,
    /// prepend file, field and record counts to each report
    #[arg(long)]
    output_meta: bool,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// csv, json, html, text or excel
    #[arg(long)]
    output_format: Option<String>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// command-line flags win over the config file
fn dialects(cli: &Cli, config: &Config) -> anyhow::Result<(Dialect, Dialect)> {
    let input = Dialect::new(
        cli.input_delimiter.as_deref().unwrap_or(&config.input.delimiter),
        cli.input_encoding.as_deref().unwrap_or(&config.input.encoding),
        config.input.header && !cli.without_header,
    )
    .context("input dialect")?
    .with_strict(cli.strict || config.input.strict)
    .with_sheet(cli.sheet.unwrap_or(config.input.sheet));
    let output = Dialect::new(
        cli.output_delimiter.as_deref().unwrap_or(&config.output.delimiter),
        cli.output_encoding.as_deref().unwrap_or(&config.output.encoding),
        config.output.header && !cli.output_without_header,
    )
    .context("output dialect")?
    .with_metadata(cli.output_meta || config.output.metadata);
    Ok((input, output))
}

fn write_reports(reports: &[Report], format: OutputFormat, dialect: &Dialect, target: Option<&PathBuf>) -> anyhow::Result<()> {
    let renderer = renderer_for(format, dialect);
    match target {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            renderer.render(reports, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            renderer.render(reports, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring config file");
        Config::default()
    });
    let (input, output) = dialects(&cli, &config)?;
    let format = OutputFormat::from_name(cli.output_format.as_deref().unwrap_or(&config.output.format));

    let reports = if cli.tabfile.is_empty() {
        tracing::info!("reading standard input");
        vec![profile_reader(io::stdin(), &input).context("standard input")?]
    } else {
        let mut collect = config.collect.clone();
        collect.recursive |= cli.recursive;
        let files = collect_files(&cli.tabfile, &collect);
        if files.is_empty() {
            bail!("no tabular files found");
        }
        tracing::info!("profiling {} files", files.len());
        let reports = profile_files(&files, &input);
        if reports.is_empty() {
            bail!("every input failed");
        }
        reports
    };

    write_reports(&reports, format, &output, cli.output.as_ref())?;
    tracing::info!(format = %format, reports = reports.len(), "done");
    Ok(())
}
