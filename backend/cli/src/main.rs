mod build_kb_cmd;
mod extract_cmd;
mod providers;
mod serve_cmd;
mod status_cmd;
mod terminal_output;
mod validate_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medassist_config::{config_file_path, load_and_prepare, validate};
use medassist_logging::init_logger;
use tracing::{error, warn};

use build_kb_cmd::BuildKbArgs;

#[derive(Parser)]
#[command(name = "medassist")]
#[command(about = "MedAssist: claim-form extraction and health-plan Q&A")]
#[command(version)]
struct Cli {
    /// Config file (default: $MEDASSIST_CONFIG, then ~/.medassist/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract a claim form (PDF, JPEG or PNG) to JSON
    Extract {
        file: PathBuf,
        /// Output file (default: <stem>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Directory holding <stem>_gt.json ground-truth files
        #[arg(long)]
        gt_dir: Option<PathBuf>,
    },
    /// Score an extracted record, against ground truth when given
    Validate {
        extracted: PathBuf,
        #[arg(long)]
        ground_truth: Option<PathBuf>,
    },
    /// Generate the knowledge base from the HTML service pages
    BuildKb {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Maximum whitespace tokens per chunk
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Show gateway health and the effective configuration
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Command failed");
        terminal_output::note_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_and_prepare(&config_file_path(cli.config.as_deref())).await?;

    let logging = config.logging.clone().unwrap_or_default();
    init_logger(
        logging.dir.as_deref().unwrap_or("logs"),
        logging.file_prefix.as_deref().unwrap_or("medassist.log"),
        logging.level.as_deref().unwrap_or("info"),
    );
    // Warnings raised while loading predate the subscriber.
    for warning in validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    match cli.command {
        Commands::Serve { port } => serve_cmd::run(config, port).await,
        Commands::Extract { file, out, gt_dir } => extract_cmd::run(&config, &file, out, gt_dir).await,
        Commands::Validate { extracted, ground_truth } => {
            validate_cmd::run(&config, &extracted, ground_truth.as_deref()).await
        }
        Commands::BuildKb { data_dir, out, max_tokens } => {
            build_kb_cmd::run(&config, BuildKbArgs { data_dir, out, max_tokens }).await
        }
        Commands::Status => status_cmd::run(&config).await,
    }
}
