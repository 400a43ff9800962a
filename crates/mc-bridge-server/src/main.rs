use mc_bridge_server::config::BridgeConfig;
use mc_bridge_server::replay::{self, Scenario};
use tracing::info;

const DEFAULT_CONFIG: &str = "bridge.toml";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, scenario_path) = match args.as_slice() {
        [scenario] => (None, scenario.as_str()),
        [config, scenario] => (Some(config.as_str()), scenario.as_str()),
        _ => {
            eprintln!("usage: mc-bridge-replay [config] <scenario.json>");
            std::process::exit(2);
        }
    };

    let config = match config_path {
        Some(path) => BridgeConfig::load(path),
        None => BridgeConfig::load_or_default(DEFAULT_CONFIG),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "mc-bridge replay v{} (retry delay {} ms)",
        env!("CARGO_PKG_VERSION"),
        config.inventory.retry_delay_ms
    );

    let scenario = match Scenario::load(scenario_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let report = match replay::run(scenario, &config, shutdown_rx).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Replay failed: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to print report: {e}");
            std::process::exit(1);
        }
    }
}
