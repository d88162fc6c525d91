//! GB Curate CLI
//!
//! Command-line tool for building the normalized dataset from coding sheets
//! and keeping the tracking document in sync.

use clap::{Parser, Subcommand};
use gb_core::pipeline::read_sheets;
use gb_core::tracking::SyncOutcome;
use gb_core::{
    run as run_pipeline, select_canonical, sync_tracking_doc, LanguageIndex, Outcome, RunConfig,
    RunReport,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gb-cli")]
#[command(about = "Feature coding dataset curation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dataset and update the tracking document
    Create {
        /// Path to run config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show which sheet is chosen for languages coded more than once
    Select {
        /// Path to run config (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Print the decisions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite only the tracking document
    SyncDoc {
        /// Path to run config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Create a run config template
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> gb_core::Result<()> {
    match command {
        Commands::Create { config } => cmd_create(&config),
        Commands::Select { config, json } => cmd_select(&config, json),
        Commands::SyncDoc { config } => cmd_sync_doc(&config),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn cmd_create(config_path: &PathBuf) -> gb_core::Result<()> {
    let config = RunConfig::load(config_path)?;
    let report = run_pipeline(&config)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    if !report.selections.is_empty() {
        println!("Duplicate sheets ({}):", report.selections.len());
        for selection in &report.selections {
            println!("  {}", selection.language_id);
            for c in &selection.candidates {
                println!("    {} dps: {} {}", c.rows, verb(c.outcome), c.path.display());
            }
        }
        println!();
    }

    if !report.empty_sheets.is_empty() {
        println!("Empty sheets ({}):", report.empty_sheets.len());
        for path in &report.empty_sheets {
            println!("  {}", path.display());
        }
        println!();
    }

    if !report.unresolved.is_empty() {
        println!("Unresolved citations ({}):", report.unresolved.len());
        for (mention, count) in report.unresolved.report() {
            println!("  {} {}", mention, count);
        }
        println!();
    }

    let dataset = &report.dataset;
    println!(
        "{} languages, {} parameters, {} codes, {} values, {} sources",
        dataset.languages.len(),
        dataset.parameters.len(),
        dataset.codes.len(),
        dataset.values.len(),
        dataset.bibliography.len()
    );
    if let Some(written) = &report.written {
        for path in &written.files_written {
            println!("  - {}", path.display());
        }
    }
    if let Some(tracking) = &report.tracking {
        print_tracking(tracking);
    }
}

fn print_tracking(tracking: &SyncOutcome) {
    println!(
        "Tracking document: {} to do, {} done",
        tracking.todo_rows, tracking.done_rows
    );
    for language in &tracking.now_done {
        println!("  now done: {}", language);
    }
}

fn cmd_select(config_path: &PathBuf, json: bool) -> gb_core::Result<()> {
    let config = RunConfig::load(config_path)?;
    let languages = LanguageIndex::load(&config.languoids)?;
    let sheets = read_sheets(&config, &languages)?;
    let total = sheets.len();
    let result = select_canonical(sheets);

    if json {
        println!("{}", serde_json::to_string_pretty(&result.selections)?);
        return Ok(());
    }

    println!("{} sheets, {} languages", total, result.sheets.len());
    for selection in &result.selections {
        println!();
        println!("Selecting best sheet for {}", selection.language_id);
        for c in &selection.candidates {
            println!("{} dps: {} sheet {}", c.rows, verb(c.outcome), c.path.display());
        }
    }
    Ok(())
}

fn verb(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Chosen => "choosing",
        Outcome::Skipped => "skipping",
    }
}

fn cmd_sync_doc(config_path: &PathBuf) -> gb_core::Result<()> {
    let config = RunConfig::load(config_path)?;
    match sync_tracking_doc(&config)? {
        Some(outcome) => print_tracking(&outcome),
        None => println!("No tracking document configured."),
    }
    Ok(())
}

fn cmd_init_config(output: &PathBuf) -> gb_core::Result<()> {
    RunConfig::template().save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the paths to match your checkout, then run:");
    println!("  gb-cli create --config {}", output.display());
    Ok(())
}
