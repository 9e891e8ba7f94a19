use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use stockwatch::cli::Args;
use stockwatch::report::{self, TracingSink};
use stockwatch::session::{BrowserProcess, ChromeBrowser, SnapshotBrowser};
use stockwatch::{AppConfig, JobRunner, RetailerRegistry};

const BANNER: &str = r#"
     _             _                  _       _
 ___| |_ ___   ___| | ____      ____ _| |_ ___| |__
/ __| __/ _ \ / __| |/ /\ \ /\ / / _` | __/ __| '_ \
\__ \ || (_) | (__|   <  \ V  V / (_| | || (__| | | |
|___/\__\___/ \___|_|\_\  \_/\_/ \__,_|\__\___|_| |_|
"#;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let level = if args.verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("stockwatch={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let edition = args.edition.unwrap_or(config.runner.edition);
    let registry = RetailerRegistry::builtin()
        .with_overrides(&config.retailers)
        .for_edition(edition);

    if args.list {
        for descriptor in registry.descriptors() {
            println!("{:<14} {:<12} {}", descriptor.key, descriptor.display_name, descriptor.target_url);
        }
        return Ok(());
    }

    println!("{}", BANNER);
    let stores = args.stores_or(&config.runner.default_retailers);
    info!("Checking {} edition at: {}", edition, stores.join(", "));

    let browser: Box<dyn BrowserProcess> = match &args.snapshot_dir {
        Some(dir) => Box::new(
            SnapshotBrowser::from_dir(dir, &registry)
                .with_context(|| format!("Failed to load snapshots from {}", dir.display()))?,
        ),
        None => Box::new(ChromeBrowser::launch(&config.browser).context("Failed to launch browser")?),
    };

    let runner = JobRunner::new(registry, Arc::new(TracingSink))
        .with_navigation_timeout(Duration::from_secs(config.browser.navigation_timeout_secs));

    // headless_chrome calls block the task, so a Chrome run only notices
    // ctrl-c at its next settle sleep.
    let records = tokio::select! {
        records = runner.run_all(browser.as_ref(), &stores) => records,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down...");
            browser.close().await.context("Failed to close browser")?;
            return Ok(());
        }
    };

    if args.json {
        println!("{}", report::render_json(&records)?);
    } else {
        print!("{}", report::render_summary(&records));
    }

    Ok(())
}
