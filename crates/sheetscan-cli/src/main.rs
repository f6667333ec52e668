//! Batch answer-sheet scoring CLI.
//!
//! Loads the pipeline configuration, an answer key and optionally a
//! scaled-score table, then runs every input photo through the decoding
//! pipeline on a worker pool. Each sheet gets an annotated preview PNG and
//! one row in `summary.csv`; a malformed photo fails alone with a concise
//! reason.

mod batch;
mod report;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};
use sheetscan_grade::{AmbiguousPolicy, Grader, ScoringTable, ScoringTableError};
use sheetscan_omr::{OmrConfig, OmrError, OmrPipeline};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("configuration file is invalid: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Pipeline(#[from] OmrError),
    #[error(transparent)]
    ScoringTable(#[from] ScoringTableError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("no input images given")]
    NoInputs,
}

#[derive(Parser, Debug)]
#[command(name = "sheetscan", about = "Score photographed answer sheets", version)]
struct Cli {
    /// Pipeline configuration JSON.
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Answer key file: 200 symbols, whitespace ignored.
    #[arg(long, value_name = "FILE")]
    key_file: PathBuf,

    /// Scaled-score table JSON; raw counts are reported as scores when
    /// omitted.
    #[arg(long, value_name = "FILE")]
    scoring: Option<PathBuf>,

    /// Output directory for previews and summary.csv.
    #[arg(long, default_value = "results")]
    out: PathBuf,

    /// Worker threads.
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    /// Report ambiguous question numbers instead of silently scoring them
    /// as incorrect.
    #[arg(long)]
    flag_ambiguous: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Sheet photographs to score.
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,
}

fn run(cli: Cli) -> Result<(), CliError> {
    if cli.images.is_empty() {
        return Err(CliError::NoInputs);
    }

    let config: OmrConfig = serde_json::from_str(&fs::read_to_string(&cli.config)?)?;
    let pipeline = OmrPipeline::new(config)?;

    let key = fs::read_to_string(&cli.key_file)?;
    let table = match &cli.scoring {
        Some(path) => ScoringTable::from_json(&fs::read_to_string(path)?)?,
        None => ScoringTable::identity(),
    };
    let policy = if cli.flag_ambiguous {
        AmbiguousPolicy::Flag
    } else {
        AmbiguousPolicy::Incorrect
    };
    let grader = Grader::new(&key, table, policy);

    let outcomes = batch::run_batch(cli.images, &pipeline, &grader, cli.jobs);

    report::save_previews(&cli.out, &outcomes)?;
    report::append_summary(&cli.out, &outcomes)?;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(sheet) => println!(
                "{}: total {} (LC {} / RC {})",
                outcome.name,
                sheet.report.total_scaled,
                sheet.report.listening_scaled,
                sheet.report.reading_scaled
            ),
            Err(reason) => println!("{}: FAILED - {reason}", outcome.name),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = sheetscan_core::init_with_level(level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
