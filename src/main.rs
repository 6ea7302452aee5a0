// Command-line entry point for virtime.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use virtime::api::dto::ReportDto;
use virtime::application::pipeline::Pipeline;
use virtime::application::{BatchReport, RewriteUsecase};
use virtime::infrastructure::concurrency::init_thread_pool;
use virtime::infrastructure::config::{OutputFormat, RewriteConfig};
use virtime::infrastructure::project_loader::ProjectLoader;
use virtime::infrastructure::{GoSourceEmitter, JsonTreeEmitter, JsonTreeLoader};
use virtime::ports::TreeEmitter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Instrument channel programs for virtual-time scheduling", long_about = None)]
struct Cli {
    /// Input tree file path (can specify multiple)
    #[arg(short, long, required = false)]
    input: Vec<PathBuf>,

    /// Input folder(s), scanned recursively for *.json tree files
    #[arg(short = 'd', long, required = false)]
    folder: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Output format (go, json) [default: go]
    #[arg(short, long)]
    format: Option<String>,

    /// Configuration file [default: ./virtime.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads [default: one per core]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Exit with failure when any file has diagnostics
    #[arg(long)]
    strict: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match (verbose, EnvFilter::try_from_default_env()) {
        (0, Ok(env)) => env,
        (0, Err(_)) => EnvFilter::new("virtime=info"),
        (1, _) => EnvFilter::new("virtime=debug"),
        _ => EnvFilter::new("virtime=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = RewriteConfig::discover(cli.config.as_deref())?;
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    if cli.strict {
        config.strict = true;
    }
    if let Some(format) = &cli.format {
        config.format = format.parse()?;
    }

    if cli.input.is_empty() && cli.folder.is_empty() {
        bail!("Please provide at least one --input <file> or --folder <dir>");
    }

    let emitter: &dyn TreeEmitter = match config.format {
        OutputFormat::Json => &JsonTreeEmitter,
        OutputFormat::Go => &GoSourceEmitter,
    };
    let jobs = ProjectLoader::plan_jobs(&cli.input, &cli.folder, &cli.output, emitter.extension())?;
    if jobs.is_empty() {
        tracing::warn!("no tree files found");
        return Ok(true);
    }

    let workers = init_thread_pool(config.jobs)?;
    tracing::info!(
        "rewriting {} files with {} workers (format: {})",
        jobs.len(),
        workers,
        config.format
    );

    let pipeline = Pipeline::new(config.facilities.clone());
    let usecase = RewriteUsecase {
        loader: &JsonTreeLoader,
        emitter,
        pipeline: &pipeline,
    };
    let report = usecase.run(&jobs);

    print_diagnostics(&report);
    if let Some(path) = &cli.report {
        let dto = ReportDto::from(&report);
        let json = serde_json::to_string_pretty(&dto)?;
        fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    println!(
        "Rewrite completed! {} files, {} failed, {} diagnostics. Output written to {}",
        report.files.len(),
        report.failures(),
        report.diagnostics(),
        cli.output.display()
    );
    Ok(report.is_clean(config.strict))
}

fn print_diagnostics(report: &BatchReport) {
    for file in &report.files {
        if let Some(outcome) = &file.outcome {
            for diagnostic in &outcome.diagnostics {
                eprintln!("{}", diagnostic);
            }
        }
        if let Some(e) = &file.error {
            eprintln!("{}", e);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}
