//! Trading loop.
//!
//! Owns the run/stop lifecycle: polls price and balances, feeds them into
//! the strategy engine, executes the resulting order, emits loop events,
//! and paces iterations with a fixed delay (longer after an error).
//!
//! The loop runs on a single dedicated task. Stopping is cooperative: the
//! running flag is checked at the top of each iteration, an in-flight
//! iteration (including its pacing sleep) always completes, and `stop`
//! joins the task before returning so callers observe full quiescence.

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::selector::StrategySelector;
use crate::config::AgentConfig;
use crate::exchange::ExchangeClient;
use crate::strategy::{self, EngineState, StrategyParams};
use crate::types::{Asset, Balances, LoopEvent, OrderAction, OrderReceipt, StrategyKind, TraderError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Loop pacing and market selection.
#[derive(Debug, Clone)]
pub struct TraderConfig {
    pub symbol: String,
    /// Nominal delay between iterations.
    pub poll_interval: Duration,
    /// Delay applied after an iteration-level error.
    pub error_backoff: Duration,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            symbol: "KRW-BTC".to_string(),
            poll_interval: Duration::from_secs(10),
            error_backoff: Duration::from_secs(5),
        }
    }
}

impl TraderConfig {
    pub fn from_config(cfg: &AgentConfig) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            error_backoff: Duration::from_secs(cfg.error_backoff_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Trader
// ---------------------------------------------------------------------------

/// Control surface for the trading loop.
///
/// `start` spawns the worker task with a fresh [`EngineState`]; `stop`
/// clears the running flag and joins the task. State never survives a
/// stop/start cycle.
pub struct Trader {
    config: TraderConfig,
    params: StrategyParams,
    selector: StrategySelector,
    events: UnboundedSender<LoopEvent>,
    client: Option<Arc<dyn ExchangeClient>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Trader {
    pub fn new(
        config: TraderConfig,
        selector: StrategySelector,
        events: UnboundedSender<LoopEvent>,
    ) -> Self {
        Self {
            config,
            params: StrategyParams::default(),
            selector,
            events,
            client: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Install an authenticated exchange client.
    pub fn connect(&mut self, client: Arc<dyn ExchangeClient>) {
        info!(exchange = client.name(), "Exchange client connected");
        self.client = Some(client);
    }

    /// Whether the loop task is currently alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Begin trading.
    ///
    /// Fails with [`TraderError::NotConnected`] when no exchange client has
    /// been installed. Calling `start` while already running is a no-op —
    /// no second loop is spawned.
    pub fn start(&mut self) -> Result<(), TraderError> {
        if self.handle.is_some() {
            debug!("Start requested while already running — ignoring");
            return Ok(());
        }

        let client = self.client.clone().ok_or(TraderError::NotConnected)?;

        self.running.store(true, Ordering::SeqCst);
        let worker = Worker {
            client,
            config: self.config.clone(),
            params: self.params.clone(),
            selector: self.selector.clone(),
            events: self.events.clone(),
            running: self.running.clone(),
        };
        self.handle = Some(tokio::spawn(worker.run()));

        let strategy = self.selector.current();
        info!(symbol = %self.config.symbol, strategy = %strategy, "Trading started");
        let _ = self.events.send(LoopEvent::Started { strategy });

        Ok(())
    }

    /// Stop trading.
    ///
    /// Clears the running flag and waits for the worker task to exit; the
    /// in-flight iteration — including its sleep — always runs to
    /// completion first. Calling `stop` while idle is a no-op.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            debug!("Stop requested while idle — nothing to do");
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = handle.await {
            error!(error = %e, "Trading loop task ended abnormally");
        }

        info!("Trading stopped");
        let _ = self.events.send(LoopEvent::Stopped);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// The loop task. Exclusively owns the [`EngineState`] for one run.
struct Worker {
    client: Arc<dyn ExchangeClient>,
    config: TraderConfig,
    params: StrategyParams,
    selector: StrategySelector,
    events: UnboundedSender<LoopEvent>,
    running: Arc<AtomicBool>,
}

impl Worker {
    async fn run(self) {
        let mut state = EngineState::new();
        let mut active = self.selector.current();

        while self.running.load(Ordering::SeqCst) {
            match self.iteration(&mut state, &mut active).await {
                Ok(()) => sleep(self.config.poll_interval).await,
                Err(e) => {
                    // Nothing terminates the loop except the running flag;
                    // unclassified errors get the longer pacing delay.
                    warn!(error = %e, "Trade loop error — backing off");
                    let _ = self.events.send(LoopEvent::IterationError {
                        reason: e.to_string(),
                    });
                    sleep(self.config.error_backoff).await;
                }
            }
        }
    }

    async fn iteration(
        &self,
        state: &mut EngineState,
        active: &mut StrategyKind,
    ) -> anyhow::Result<()> {
        // Absent price/balance degrades to zero: a zero balance fails every
        // order threshold naturally, so the iteration proceeds without noise.
        let price = self
            .client
            .current_price(&self.config.symbol)
            .await?
            .unwrap_or(Decimal::ZERO);
        let krw = self.client.balance(Asset::Krw).await?.unwrap_or(Decimal::ZERO);
        let btc = self.client.balance(Asset::Btc).await?.unwrap_or(Decimal::ZERO);
        let balances = Balances::new(krw, btc);

        let selected = self.selector.current();
        if selected != *active {
            info!(from = %active, to = %selected, "Strategy switched");
            let _ = self.events.send(LoopEvent::StrategySwitched {
                from: *active,
                to: selected,
            });
            *active = selected;
        }

        match strategy::evaluate(state, price, &balances, selected, &self.params) {
            Some(action) => self.execute(selected, action).await,
            None => {
                debug!(price = %price, balances = %balances, strategy = %selected, "No action");
            }
        }

        Ok(())
    }

    /// Submit an order. Failures are logged with strategy context and do
    /// not propagate; the next iteration re-evaluates from scratch.
    async fn execute(&self, strategy: StrategyKind, action: OrderAction) {
        match self.submit(action).await {
            Ok(receipt) => {
                info!(
                    strategy = %strategy,
                    action = %action,
                    order_id = %receipt.order_id,
                    "Order placed"
                );
                let _ = self.events.send(LoopEvent::OrderPlaced {
                    strategy,
                    action,
                    receipt,
                });
            }
            Err(e) => {
                warn!(strategy = %strategy, action = %action, error = %e, "Order failed");
                let _ = self.events.send(LoopEvent::OrderFailed {
                    strategy,
                    action,
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn submit(&self, action: OrderAction) -> anyhow::Result<OrderReceipt> {
        match action {
            OrderAction::Buy { quote_amount } => {
                self.client.buy_market(&self.config.symbol, quote_amount).await
            }
            OrderAction::Sell { base_amount } => {
                self.client.sell_market(&self.config.symbol, base_amount).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
