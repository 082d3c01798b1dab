mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tabline",
    version,
    about = "Rebuild text lines from layout markup and extract tables from documents"
)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct ordered text lines from a positioned layout markup dump
    Lines {
        /// Path to the layout markup (XHTML/hOCR-style) file
        markup_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the lines to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Extract tables from a document with the external extraction engine
    Extract {
        /// Path to the document (PDF)
        document: PathBuf,

        /// Write a CSV file here instead of printing the rows
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Pages: all, N, N-M or a comma list of those
        #[arg(short, long, default_value = "all")]
        pages: String,

        /// Segmentation mode: lattice (ruling lines) or stream (whitespace)
        #[arg(short, long, default_value = "lattice")]
        mode: String,

        /// Crop area in points
        #[arg(short, long, value_name = "TOP,LEFT,BOTTOM,RIGHT")]
        area: Option<String>,

        /// JSON engine config file
        #[arg(short, long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Engine executable, run without base arguments (overrides config)
        #[arg(long, value_name = "PROGRAM")]
        engine: Option<PathBuf>,

        /// Engine timeout in seconds (overrides config)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Output format for printed rows: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Check that the table extraction engine can be started
    Check {
        /// JSON engine config file
        #[arg(short, long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Engine executable, run without base arguments (overrides config)
        #[arg(long, value_name = "PROGRAM")]
        engine: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Lines {
            markup_file,
            output,
            out,
        } => commands::lines::run(markup_file, &output, out),
        Commands::Extract {
            document,
            out,
            pages,
            mode,
            area,
            config,
            engine,
            timeout,
            output,
        } => commands::extract::run(commands::extract::ExtractArgs {
            document,
            out,
            pages,
            mode,
            area,
            engine: commands::EngineOverrides {
                config,
                program: engine,
                timeout_secs: timeout,
            },
            output_format: output,
        }),
        Commands::Check { config, engine } => commands::check::run(commands::EngineOverrides {
            config,
            program: engine,
            timeout_secs: None,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
