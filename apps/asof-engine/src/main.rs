//! Asof Engine Binary
//!
//! Joins two JSON Lines streams point-in-time, or generates synthetic ones.
//!
//! # Usage
//!
//! ```bash
//! asof-engine join --primary trades.jsonl --reference quotes.jsonl --mode outer
//! asof-engine generate --primaries 100000 --references 50000 --out-dir data/
//! ```
//!
//! # Environment Variables
//!
//! - `ASOF_CONFIG`: Path to the YAML config (default: `asof.yaml` if present)
//! - `RUST_LOG`: Log filter, overrides the configured level

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asof_engine::config::{DEFAULT_CONFIG_PATH, JoinConfig, load_config};
use asof_engine::domain::{RawEvent, StreamKind};
use asof_engine::jsonl::{read_jsonl_numbered, write_jsonl, write_lines};
use asof_engine::observability::init_logging;
use asof_engine::output::RowWriter;
use asof_engine::synthetic::{SyntheticSpec, generate};
use asof_engine::{AsofJoiner, JoinError, JoinMode, JoinStats, OutputOrder};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

/// Untyped row payload: every field except `group_key` and `timestamp`.
type Fields = Map<String, Value>;

#[derive(Parser, Debug)]
#[command(
    name = "asof-engine",
    version,
    about = "Point-in-time (AS-OF) join of time-ordered event streams",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a primary stream against a reference stream
    Join(JoinArgs),
    /// Write synthetic trades.jsonl and quotes.jsonl
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct JoinArgs {
    /// Primary stream (JSON Lines)
    #[arg(long, value_name = "FILE")]
    primary: PathBuf,
    /// Reference stream (JSON Lines)
    #[arg(long, value_name = "FILE")]
    reference: PathBuf,
    /// Config file (env: ASOF_CONFIG)
    #[arg(long, value_name = "FILE", env = "ASOF_CONFIG")]
    config: Option<PathBuf>,
    /// inner | outer (overrides config)
    #[arg(long, value_name = "MODE")]
    mode: Option<JoinMode>,
    /// by_group_then_time | stream_order (overrides config)
    #[arg(long, value_name = "ORDER")]
    order: Option<OutputOrder>,
    /// Output file; stdout when omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of trades
    #[arg(long, default_value_t = 100_000)]
    primaries: usize,
    /// Number of quotes
    #[arg(long, default_value_t = 50_000)]
    references: usize,
    /// Number of symbols
    #[arg(long, default_value_t = 100)]
    groups: usize,
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Join(args) => run_join(args),
        Command::Generate(args) => run_generate(args),
    }
}

/// Load .env from the working directory or its nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

fn load_dotenv_from_ancestors() {
    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    let Some(env_path) = cwd
        .ancestors()
        .skip(1)
        .map(|dir| dir.join(".env"))
        .find(|path| path.is_file())
    else {
        return;
    };
    if let Err(e) = dotenvy::from_path(&env_path) {
        eprintln!("Ignoring unreadable {}: {e}", env_path.display());
    }
}

/// Input file and the line number of each of its rows.
struct Source<'a> {
    path: &'a Path,
    lines: Vec<usize>,
}

impl Source<'_> {
    fn line_of(&self, position: usize) -> Option<String> {
        self.lines
            .get(position)
            .map(|line| format!("{}:{line}", self.path.display()))
    }
}

/// Read a JSON Lines stream, remembering where each row came from.
fn read_stream(path: &Path) -> Result<(Source<'_>, Vec<RawEvent<Fields>>)> {
    let (lines, rows) = read_jsonl_numbered::<RawEvent<Fields>>(path)?.into_iter().unzip();
    Ok((Source { path, lines }, rows))
}

/// Attach the file line of a malformed row to a join error.
fn locate(err: JoinError, primary: &Source<'_>, reference: &Source<'_>) -> anyhow::Error {
    let location = match &err {
        JoinError::MalformedEvent {
            stream, position, ..
        } => match stream {
            StreamKind::Primary => primary.line_of(*position),
            StreamKind::Reference => reference.line_of(*position),
        },
        _ => None,
    };
    let context = match location {
        Some(line) => format!("joining streams: bad row at {line}"),
        None => "joining streams".to_string(),
    };
    anyhow::Error::new(err).context(context)
}

/// Explicit path, else `asof.yaml` when present, else defaults.
fn resolve_config(path: Option<&Path>) -> Result<JoinConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => PathBuf::from(DEFAULT_CONFIG_PATH),
        None => return Ok(JoinConfig::default()),
    };
    let path = path.to_string_lossy();
    Ok(load_config(Some(&path))?)
}

fn run_join(args: JoinArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.join_mode = mode;
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    init_logging(&config.observability.logging)?;

    let (primary_source, primary) = read_stream(&args.primary)?;
    let (reference_source, reference) = read_stream(&args.reference)?;
    let writer = RowWriter::for_payloads(reference.iter().map(|r| &r.payload))?;

    let output = AsofJoiner::new(config)
        .join_rows(primary, reference)
        .map_err(|e| locate(e, &primary_source, &reference_source))?;
    let rows = output
        .records
        .iter()
        .map(|record| writer.row(record))
        .collect::<Result<Vec<_>, _>>()?;

    let written = match &args.output {
        Some(path) => write_jsonl(path, rows)?,
        None => write_lines(io::stdout().lock(), rows)?,
    };
    log_stats(&output.stats, written);
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    init_logging(&JoinConfig::default().observability.logging)?;

    let spec = SyntheticSpec {
        primaries: args.primaries,
        references: args.references,
        groups: args.groups,
        seed: args.seed,
        ..SyntheticSpec::default()
    };
    let (trades, quotes) = generate(&spec);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let trades_path = args.out_dir.join("trades.jsonl");
    let quotes_path = args.out_dir.join("quotes.jsonl");
    write_jsonl(&trades_path, trades.iter().map(RawEvent::from_event))?;
    write_jsonl(&quotes_path, quotes.iter().map(RawEvent::from_event))?;

    tracing::info!(
        primaries = spec.primaries,
        references = spec.references,
        groups = spec.groups,
        seed = spec.seed,
        trades = %trades_path.display(),
        quotes = %quotes_path.display(),
        "Synthetic streams written"
    );
    Ok(())
}

fn log_stats(stats: &JoinStats, written: usize) {
    tracing::info!(
        groups = stats.groups,
        primary_events = stats.primary_events,
        reference_events = stats.reference_events,
        matched = stats.matched,
        match_rate = stats.match_rate(),
        merge_steps = stats.merge_steps,
        threads = stats.threads,
        rows_written = written,
        elapsed_ms = stats.elapsed_ms,
        "Join finished"
    );
}
