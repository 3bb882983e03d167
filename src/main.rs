//! AUTOBIT — Unattended KRW-BTC trading agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds an exchange client (authenticated Upbit when API keys are
//! present, otherwise a paper exchange over the live ticker), and runs
//! the trading loop until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use autobit::config::AppConfig;
use autobit::engine::selector::StrategySelector;
use autobit::engine::trader::{Trader, TraderConfig};
use autobit::exchange::paper::PaperExchange;
use autobit::exchange::upbit::UpbitClient;
use autobit::exchange::{Credentials, ExchangeClient};
use autobit::types::StrategyKind;

const BANNER: &str = r#"
    _   _   _ _____ ___  ____ ___ _____
   / \ | | | |_   _/ _ \| __ )_ _|_   _|
  / _ \| | | | | || | | |  _ \| |  | |
 / ___ \ |_| | | || |_| | |_) | |  | |
/_/   \_\___/  |_| \___/|____/___| |_|

  Unattended KRW-BTC Trading Agent
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        symbol = %cfg.agent.symbol,
        poll_interval_secs = cfg.agent.poll_interval_secs,
        default_strategy = %cfg.agent.default_strategy,
        "AUTOBIT starting up"
    );

    // -- Exchange client ---------------------------------------------------

    let access_key = std::env::var(&cfg.exchange.access_key_env)
        .ok()
        .filter(|k| !k.is_empty());
    let secret_key = std::env::var(&cfg.exchange.secret_key_env)
        .ok()
        .filter(|k| !k.is_empty());

    let client: Arc<dyn ExchangeClient> = match (access_key, secret_key) {
        (Some(access), Some(secret)) => {
            info!("Using authenticated Upbit client");
            Arc::new(UpbitClient::new(
                &cfg.exchange.base_url,
                Credentials::new(access, secret),
            )?)
        }
        _ => {
            warn!(
                krw = %cfg.paper.krw,
                btc = %cfg.paper.btc,
                "No exchange API keys configured — paper trading over the live ticker"
            );
            let prices = Arc::new(UpbitClient::public(&cfg.exchange.base_url)?);
            Arc::new(PaperExchange::new(prices, cfg.paper.krw, cfg.paper.btc))
        }
    };

    // -- Selector, event consumer, trader ----------------------------------

    let initial: StrategyKind = cfg.agent.default_strategy.parse()?;
    let selector = StrategySelector::new(initial);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        // Presentation lives here, fully decoupled from the loop.
        while let Some(event) = events_rx.recv().await {
            info!("{event}");
        }
    });

    let mut trader = Trader::new(TraderConfig::from_config(&cfg.agent), selector, events_tx);
    trader.connect(client);
    trader.start()?;

    info!("Trading loop running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received.");
    trader.stop().await;
    info!("AUTOBIT shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autobit=info"));

    let json_logging = std::env::var("AUTOBIT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
