use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use statement_tables::{
    EventSink, PageSelection, ParseOptions, ParseReport, RecordingSink, StatementLayout, Token,
    TracingSink, extract_tokens_from_pdf, parse_statement_with_report, tokens_from_json,
    write_csv, write_json,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stmt2json",
    version,
    about = "Reconstruct transaction tables from bank statement PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract transactions and write them as JSON or CSV.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF, or a JSON token dump with --tokens.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the input as a JSON array of {text, x, y, page_number}.
    #[arg(long)]
    tokens: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// JSON file with engine options; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tokens per header-scoring chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Vertical tolerance for header row clustering.
    #[arg(long)]
    y_tol: Option<f64>,

    /// Horizontal tolerance for matching body tokens to columns.
    #[arg(long)]
    x_tol: Option<f64>,

    /// Minimum tokens in a header row.
    #[arg(long)]
    min_cols: Option<usize>,

    /// Print per-page events to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn load_options(args: &ExtractArgs) -> Result<ParseOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            serde_json::from_str::<ParseOptions>(&raw)
                .with_context(|| format!("failed to parse config '{}'", path.display()))?
        }
        None => ParseOptions::default(),
    };

    if let Some(chunk_size) = args.chunk_size {
        options.chunk_size = chunk_size;
    }
    if let Some(y_tol) = args.y_tol {
        options.y_tol = y_tol;
    }
    if let Some(x_tol) = args.x_tol {
        options.column_x_tol = x_tol;
    }
    if let Some(min_cols) = args.min_cols {
        options.min_cols = min_cols;
    }

    options.pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    Ok(options)
}

fn load_tokens(args: &ExtractArgs) -> Result<Vec<Token>> {
    if args.tokens {
        let raw = std::fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read '{}'", args.input.display()))?;
        return tokens_from_json(&raw).context("invalid token dump");
    }

    extract_tokens_from_pdf(&args.input)
        .with_context(|| format!("failed to read tokens from '{}'", args.input.display()))
}

fn write_layout(args: &ExtractArgs, layout: &StatementLayout) -> Result<()> {
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    match args.format {
        OutputFormat::Json => {
            write_json(&mut writer, layout)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => write_csv(&mut writer, &layout.transactions, b',')?,
    }
    writer.flush()?;
    Ok(())
}

fn log_report(report: &ParseReport, sink: &RecordingSink, verbose: bool) {
    let skipped = sink.skipped_pages();
    if !skipped.is_empty() {
        eprintln!("warning: {} page(s) produced no transactions", skipped.len());
    }
    if !verbose {
        return;
    }

    eprintln!(
        "pages={} with_header={} dual_table={} transactions={}",
        report.page_count, report.pages_with_header, report.dual_table_pages, report.transaction_count
    );
    for (page, reason) in skipped {
        eprintln!("  - page {page}: {}", reason.as_str());
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ParseReport> {
    let options = load_options(args)?;
    let tokens = load_tokens(args)?;

    let mut sink = RecordingSink::default();
    let (layout, report) = parse_statement_with_report(&tokens, &options, &mut sink)
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;
    for event in &sink.events {
        TracingSink.emit(event.clone());
    }
    write_layout(args, &layout)?;

    log_report(&report, &sink, args.verbose);
    Ok(report)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("statement_tables=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                if report.transaction_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
