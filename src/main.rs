//! # Main Entry Point
//!
//! Wires the layers together:
//! - Domain: Configuration and Types
//! - Infrastructure: Twitter source, Matrix sink
//! - Application: Bootstrap, Filter, Formatter, Poll Cycle
//!
//! Bootstrap failures log and exit with status 1; once the poll loop is
//! running the process only stops on termination.

mod application;
mod domain;
mod infrastructure;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use crate::application::bootstrap;
use crate::application::filter::HashtagFilter;
use crate::application::formatter::NoticeFormatter;
use crate::application::poller::PollCycle;
use crate::domain::config::AppConfig;
use crate::domain::error::BootstrapError;
use crate::infrastructure::matrix::MatrixNotifier;
use crate::infrastructure::twitter::TwitterTimeline;

/// Bridge a Twitter list timeline into a Matrix room.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(e) = run(&args).await {
        error!("Startup failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(&args.config)?;
    info!("Starting tweetrix...");

    let list = config.services.twitter.list_address()?;

    let source = TwitterTimeline::connect(&config.services.twitter.app)
        .await
        .context("Twitter authentication failed")?;

    let cursor = match bootstrap::prime_cursor(&source, &list).await {
        Ok(cursor) => cursor,
        Err(BootstrapError::ListNotFound { list, available }) => {
            error!("Configured list {list} was not found");
            if available.is_empty() {
                error!("No owned lists were found for the configured account");
            } else {
                error!(
                    "Lists owned by the configured account: {}",
                    available.join(", ")
                );
            }
            anyhow::bail!("configured list not found");
        }
        Err(e) => return Err(e).context("Cursor bootstrap failed"),
    };

    let sink = MatrixNotifier::connect(&config.services.matrix)
        .await
        .context("Matrix initialization failed")?;

    info!(
        "Bridging list {} into {}",
        list, config.services.matrix.room_id
    );

    let cycle = PollCycle::new(
        source,
        sink,
        HashtagFilter::new(config.services.twitter.hashtag.clone()),
        NoticeFormatter::new(config.services.matrix.notice_template.clone()),
        list,
        cursor,
        Duration::from_secs(config.system.poll_interval_secs),
    );
    cycle.run().await;

    Ok(())
}
