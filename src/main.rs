//! tbt command-line interface.
//!
//! Scan mode hashes a file or directory tree into a hash database;
//! compare mode loads an existing database to filter it, re-emit it, or
//! produce a similarity report. All failures exit non-zero with a message
//! on stderr, and structural failures never leave a partial output file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use tbt::config::EngineConfig;
use tbt::db::{Algorithm, AlgorithmTag, HashStore};
use tbt::scan::{ScanOrchestrator, Selection};
use tbt::Comparator;

/// Default database filename used when `-o` is not given in scan mode.
const DEFAULT_OUTPUT: &str = "tbt.db";

#[derive(Debug, Parser)]
#[command(name = "tbt", version, about = "Compute and compare fuzzy hashes (CTPH, SIMHASH)")]
struct Cli {
    /// File or directory to scan
    path: Option<PathBuf>,

    /// Hash algorithm
    #[arg(short, long, value_enum, ignore_case = true, value_name = "ALGO")]
    algorithm: Option<AlgorithmArg>,

    /// Write the resulting database to FILE
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Load an existing database from DBFILE instead of scanning
    #[arg(short, long, value_name = "DBFILE")]
    compare: Option<PathBuf>,

    /// Only report pairs whose identifiers contain this substring
    #[arg(long, value_name = "SUBSTR")]
    filter: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    Ctph,
    Simhash,
    All,
}

impl AlgorithmArg {
    fn selection(self) -> Selection {
        match self {
            AlgorithmArg::Ctph => Selection::Ctph,
            AlgorithmArg::Simhash => Selection::Simhash,
            AlgorithmArg::All => Selection::All,
        }
    }

    fn algorithm(self) -> Option<Algorithm> {
        match self {
            AlgorithmArg::Ctph => Some(Algorithm::Ctph),
            AlgorithmArg::Simhash => Some(Algorithm::Simhash),
            AlgorithmArg::All => None,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    if cli.log_json {
        tbt::logging::init_tracing_json(level);
    } else {
        tbt::logging::init_tracing(level);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tbt: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = EngineConfig::default();
    match cli.compare.clone() {
        None => scan_mode(cli, cfg),
        Some(dbfile) => compare_mode(cli, dbfile, cfg),
    }
}

/// `tbt <PATH> [-a ALGO] [-o FILE]`: hash a tree into a fresh database.
fn scan_mode(cli: Cli, cfg: EngineConfig) -> anyhow::Result<()> {
    let path = cli
        .path
        .context("no scan path given (see --help for usage)")?;
    let selection = cli
        .algorithm
        .map(AlgorithmArg::selection)
        .unwrap_or_default();

    let store = ScanOrchestrator::new(cfg)
        .scan(&path, selection)
        .with_context(|| format!("scanning {}", path.display()))?;

    let output = cli.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    store
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        output = %output.display(),
        records = store.record_count(),
        "scan complete"
    );
    Ok(())
}

/// `tbt -c DBFILE [-a ALGO] [-o FILE] [PATH]`: load, filter, report, re-emit.
fn compare_mode(cli: Cli, dbfile: PathBuf, cfg: EngineConfig) -> anyhow::Result<()> {
    let store = HashStore::load(&dbfile)
        .with_context(|| format!("loading {}", dbfile.display()))?;

    // Algorithm filtering happens before any comparison or output; a
    // request the store cannot satisfy is fatal and produces no file.
    let store = match cli.algorithm.and_then(AlgorithmArg::algorithm) {
        Some(algorithm) => {
            let db = store.select(algorithm)?;
            let mut filtered = HashStore::new();
            filtered.push_database(db.clone());
            filtered
        }
        None => store,
    };

    let comparator = Comparator::new(&cfg);

    if let Some(path) = &cli.path {
        // Re-scan the path with each loaded section's algorithm and score
        // every fresh file against every loaded record.
        for db in store.databases() {
            let mut scan_cfg = cfg.clone();
            let selection = match db.tag() {
                AlgorithmTag::Ctph => Selection::Ctph,
                AlgorithmTag::Simhash(width) => {
                    scan_cfg.simhash.width = width;
                    Selection::Simhash
                }
            };
            let fresh = ScanOrchestrator::new(scan_cfg)
                .scan(path, selection)
                .with_context(|| format!("re-scanning {}", path.display()))?;
            let fresh_db = fresh.select(db.tag().algorithm())?;
            let report = comparator.compare_across(fresh_db, db)?;
            print!("{report}");
        }
    } else if cli.output.is_none() {
        // Pure report mode: pairwise similarity within each section
        for db in store.databases() {
            let report = comparator.compare_database(db, cli.filter.as_deref())?;
            print!("{report}");
        }
    }

    if let Some(output) = &cli.output {
        store
            .save(output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(output = %output.display(), "filtered database written");
    }

    Ok(())
}
