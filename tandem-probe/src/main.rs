use anyhow::{Context, Result};
use tandem_core::EngineConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tandem_probe::init_tracing();
    tandem_probe::install_panic_hook();

    let config = EngineConfig::load().context("Failed to load engine config")?;
    tracing::info!(
        time_budget_ms = config.time_budget_ms,
        yield_delay_ms = config.yield_delay_ms,
        path = ?EngineConfig::default_path(),
        "=== Tandem Probe Starting ==="
    );

    let report = tandem_probe::run(&config).await?;
    tracing::info!(
        turns = report.turns,
        elapsed_ms = report.elapsed_ms,
        cache_invocations = report.cache_invocations,
        "probe finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
