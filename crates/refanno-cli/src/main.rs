#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use refanno_core::config::resolve_config;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "refanno: span annotation with provenance and review history",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Summarise a document",
        long_about = "Show per-paragraph entity counts, review states and overlaps.",
        after_help = "EXAMPLES:\n    # Summarise a REF document\n    refanno inspect corpus.json\n\n    # Emit machine-readable output\n    refanno inspect corpus.json --json"
    )]
    Inspect(cmd::inspect::InspectArgs),

    #[command(
        next_help_heading = "Read",
        about = "List overlapping annotations",
        long_about = "List groups of overlapping blocks per paragraph.",
        after_help = "EXAMPLES:\n    # All overlaps\n    refanno conflicts corpus.json\n\n    # Only overlaps between different labels\n    refanno conflicts corpus.json --mixed-labels"
    )]
    Conflicts(cmd::conflicts::ConflictsArgs),

    #[command(
        next_help_heading = "Write",
        about = "Export with provenance",
        long_about = "Load a document, apply review decisions and export it, appending history entries for the annotator.",
        after_help = "EXAMPLES:\n    # Export to stdout\n    refanno export corpus.json --annotator ana\n\n    # Accept the block at offset 0 of paragraph 1 and write a file\n    refanno export corpus.json --annotator ana --review 1:0=Accepted -o reviewed.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Tools",
        about = "Print token spans",
        long_about = "Split text into tokens and print their UTF-16 offsets.",
        after_help = "EXAMPLES:\n    refanno tokenize \"Ada met Bob in Paris.\""
    )]
    Tokenize(cmd::tokenize::TokenizeArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REFANNO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "refanno=debug,refanno_core=debug,info"
        } else {
            "refanno=info,refanno_core=info,warn"
        })
    });

    let format = env::var("REFANNO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = resolve_config(&project_root, cli.json)?;
    let output = OutputMode::from_resolved(&config.resolved_output);

    match cli.command {
        Commands::Inspect(ref args) => cmd::inspect::run_inspect(args, output),
        Commands::Conflicts(ref args) => cmd::conflicts::run_conflicts(args, output),
        Commands::Export(ref args) => cmd::export::run_export(args, &config, output),
        Commands::Tokenize(ref args) => cmd::tokenize::run_tokenize(args, output),
    }
}
