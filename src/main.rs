use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use delegation_lens::app::App;
use delegation_lens::config::{self, LOG_FILTER_ENV};
use delegation_lens::export;
use delegation_lens::ingest::LogFile;
use delegation_lens::prune::prune;
use delegation_lens::report::{ReportFormatter, TextFormatter};
use delegation_lens::stats::{Dimension, DIMENSION_NAMES};

#[derive(ClapParser, Debug)]
#[command(name = "dlens", about = "Inspect agent delegation logs")]
struct Cli {
    /// Path to the delegation log (defaults to $DLENS_LOG_FILE, then ~/.dlens/delegations.jsonl).
    #[arg(short, long, global = true)]
    log: Option<PathBuf>,

    /// Restrict queries to one run id, or `latest` for the newest run.
    #[arg(short, long, global = true)]
    run: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List runs, newest first.
    Runs,
    /// Show the delegation tree.
    Tree,
    /// Show delegations that have started but not finished.
    Active,
    /// Group completed delegations along one dimension.
    Stats {
        #[arg(help = stats_help())]
        dimension: Dimension,
    },
    /// Headline totals.
    Summary,
    /// Drop all but the newest runs from the log.
    Prune {
        #[arg(short, long)]
        keep: usize,
    },
    /// Write the (filtered) log to stdout.
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Jsonl,
}

fn stats_help() -> String {
    format!("One of: {}", DIMENSION_NAMES.join(", "))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = Cli::parse();

    let log_path = config::resolve_log_path(cli.log)?;

    let load = || App::load(LogFile::new(&log_path), cli.run.clone());
    let formatter = TextFormatter::default();

    match cli.command {
        Command::Runs => print!("{}", formatter.runs(&load().runs())),
        Command::Tree => print!("{}", formatter.tree(&load().tree())),
        Command::Active => print!("{}", formatter.active(&load().active())),
        Command::Stats { dimension } => {
            print!("{}", formatter.rows(dimension, &load().aggregate(dimension)))
        }
        Command::Summary => {
            let app = load();
            print!("{}", formatter.totals(app.run_filter.as_deref(), &app.summary()));
        }
        Command::Export { format } => {
            let app = load();
            let out = BufWriter::new(io::stdout().lock());
            let written = match format {
                ExportFormat::Csv => export::write_csv(app.events(), out),
                ExportFormat::Jsonl => export::write_jsonl(app.records(), out),
            }
            .wrap_err("Failed to write export")?;
            tracing::debug!(rows = written, ?format, "export finished");
        }
        Command::Prune { keep } => {
            if cli.run.is_some() {
                tracing::warn!("--run is ignored by prune");
            }
            let result = prune(&log_path, keep)?;
            println!(
                "Pruned {} run(s): removed {} event(s), kept {}.",
                result.pruned_runs, result.removed_events, result.kept_events
            );
        }
    }

    Ok(())
}
