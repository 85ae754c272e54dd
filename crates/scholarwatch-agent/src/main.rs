//! scholarwatch: daily academic literature digest.
//! Searches Web of Science, summarizes new articles against a thesis subject
//! with an LLM, and emails the rendered digest.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod logging;
mod pipeline;
mod schedule;

use config::Config;
use pipeline::DigestPipeline;

const ENV_CI: &str = "GITHUB_ACTIONS";

#[derive(Debug, Parser)]
#[command(name = "scholarwatch", version, about = "Daily academic literature digest")]
struct Cli {
    /// Configuration file (default: config/scholarwatch.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single digest and exit
    #[arg(long)]
    once: bool,

    /// Render and save the digest without emailing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let created = Config::write_default_if_missing(&config_path)
        .with_context(|| format!("cannot create default config at {}", config_path.display()))?;
    let config = Config::load(&config_path)?;

    logging::init(&config.system.log_dir)?;
    info!(config = %config_path.display(), "scholarwatch starting");
    if created {
        warn!(path = %config_path.display(), "No configuration found; wrote a template. Fill in your keys and topics.");
    }
    config.validate()?;

    let once = cli.once || std::env::var_os(ENV_CI).is_some();
    let pipeline = DigestPipeline::from_config(&config, cli.dry_run)?;

    if once {
        let today = chrono::Local::now().date_naive();
        let report = pipeline.run(today).await?;
        info!(?report, "One-shot run complete");
        return Ok(());
    }

    let run_at = config.schedule.run_at_time()?;
    info!(run_at = %config.schedule.run_at, "Scheduled mode: running now, then daily");

    let pipeline = &pipeline;
    let runs = schedule::run_daily(
        run_at,
        schedule::POLL_INTERVAL,
        || chrono::Local::now().naive_local(),
        move |today| async move { pipeline.run(today).await.map(|_| ()) },
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        },
    )
    .await;

    info!(runs, "scholarwatch stopped");
    Ok(())
}
