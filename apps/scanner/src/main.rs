mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing, log_usage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config)?;

    tracing::info!(
        "Breakout scanner starting with {} tiers, data in {}",
        state.tiers.len(),
        config.data_dir.display()
    );
    log_usage(&state);

    let handles = scheduler::start(state.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    for handle in handles {
        handle.abort();
    }
    log_usage(&state);
    Ok(())
}
