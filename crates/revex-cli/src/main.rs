mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use revex_core::ExtractionSettings;

#[derive(Debug, Parser)]
#[command(name = "revex")]
#[command(about = "Product review extraction from the command line")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract every review page, starting from a review-page URL
    Extract {
        /// Review page (or product page) URL to start from
        url: String,

        /// Collect reviewer-attached image URLs
        #[arg(long)]
        include_images: bool,

        /// Collect helpful-vote counts
        #[arg(long)]
        include_helpful: bool,

        /// Collect verified-purchase badges
        #[arg(long)]
        include_verified: bool,

        /// Write the results to FILE as CSV once the run completes
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Discard any persisted session instead of resuming it
        #[arg(long)]
        fresh: bool,

        /// JSON file overriding the built-in selector chains
        #[arg(long, value_name = "FILE")]
        selectors: Option<PathBuf>,
    },
    /// Resume an interrupted extraction from the page it stopped on
    Resume {
        /// URL of the page the interrupted run stopped on
        url: String,

        /// JSON file overriding the built-in selector chains
        #[arg(long, value_name = "FILE")]
        selectors: Option<PathBuf>,
    },
    /// Export the persisted reviews to CSV and clear the session
    Export {
        /// Output file; defaults to reviews_<product>_<date>.csv
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Show the state of the persisted extraction session
    Status,
    /// Clear all persisted extraction state
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = revex_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            url,
            include_images,
            include_helpful,
            include_verified,
            out,
            fresh,
            selectors,
        } => {
            let settings = ExtractionSettings {
                include_images,
                include_helpful,
                include_verified,
            };
            let selectors = commands::load_selectors(selectors.as_deref())?;
            commands::run_extract(&config, &url, settings, selectors, out.as_deref(), fresh).await
        }
        Commands::Resume { url, selectors } => {
            let selectors = commands::load_selectors(selectors.as_deref())?;
            commands::run_resume(&config, &url, selectors).await
        }
        Commands::Export { out } => commands::run_export(&config, out).await,
        Commands::Status => commands::run_status(&config).await,
        Commands::Reset => commands::run_reset(&config).await,
    }
}
