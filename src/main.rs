use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use runtime_duel_engine::core::report::{build_report, to_json};
use runtime_duel_engine::core::sleep_guard::SleepGuard;
use runtime_duel_engine::models::args::Args;
use runtime_duel_engine::{HttpClient, LoadDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let output = args.output.clone();
    let _guard = SleepGuard::new(args.prevent_sleep);
    let config = args.into_config();
    config.validate()?;
    if config.targets.len() < 2 {
        bail!("two targets are needed for a comparison, got {}", config.targets.len());
    }
    let baseline = config.targets[0].name.clone();
    let contender = config.targets[1].name.clone();
    info!(
        "{} v{}: {} vs {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        baseline,
        contender
    );

    let client = HttpClient::new(config.targets.clone(), config.request_timeout)?;
    let mut driver = LoadDriver::new(client, config)?;

    let results = driver.run_all().await;
    let server_metrics = driver.collect_final_metrics().await;
    let collector_stats = driver.collector_stats();
    driver.into_client().close();

    let report = build_report(&results, &baseline, &contender, server_metrics, collector_stats)?;
    for line in &report.efficiency.narrative {
        info!("{}", line);
    }
    let json = to_json(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
