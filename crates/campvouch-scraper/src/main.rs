//! CampVouch Scraper - snapshot collection tool

use anyhow::Result;
use campvouch_common::logging::{init_logging, LogConfig, LogLevel};
use campvouch_scraper::config::ScraperConfig;
use campvouch_scraper::pipeline::Pipeline;
use campvouch_scraper::publish::SnapshotPublisher;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campvouch-scraper")]
#[command(author, version, about = "CampVouch club voucher snapshot tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the full discovery-and-collection pipeline
    Run {
        /// Output directory for snapshots
        #[arg(short, long, env = "CAMPVOUCH_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Upstream API base URL
        #[arg(long, env = "CAMPVOUCH_BASE_URL")]
        base_url: Option<String>,

        /// Total prize pool in CHF
        #[arg(long, env = "CAMPVOUCH_PRIZE_POOL")]
        prize_pool: Option<f64>,
    },

    /// Rewrite latest.json from the newest timestamped snapshot
    RegenerateLatest {
        /// Directory containing the snapshots
        #[arg(short, long, env = "CAMPVOUCH_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let mut log_config = LogConfig::from_env()?;
    log_config.level = log_level;
    init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            data_dir,
            base_url,
            prize_pool,
        } => {
            let mut config = ScraperConfig::default();
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(url) = base_url {
                config.base_url = url;
            }
            if let Some(pool) = prize_pool {
                config.prize_pool = pool;
            }

            let snapshot = Pipeline::new(config).run().await?;
            info!(
                total_clubs = snapshot.metadata.total_clubs,
                "Snapshot published"
            );
        },
        Command::RegenerateLatest { data_dir } => {
            let publisher = SnapshotPublisher::new(data_dir);
            match publisher.regenerate_latest()? {
                Some(source) => info!(source = %source.display(), "latest.json regenerated"),
                None => anyhow::bail!("No timestamped snapshot found to regenerate from"),
            }
        },
    }

    Ok(())
}
