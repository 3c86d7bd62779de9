use tracing_subscriber::EnvFilter;
use waiting_interval_cli::{run, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let report = run(&config).await?;
    tracing::info!(
        firings = report.fired_at.len(),
        halted = report.halted,
        remaining_delays = ?report.remaining_delays,
        "done"
    );
    Ok(())
}
