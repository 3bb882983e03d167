//! Shared types for the AUTOBIT agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that exchange, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// The three interchangeable decision strategies.
///
/// Selected live by the operator; the trading loop reads the selection
/// fresh at every iteration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Buys half the quote balance on a single-step 1% drop.
    Aggressive,
    /// Sells the full base balance on a slow rise across a 30-sample window.
    Safe,
    /// Symmetric: sells 30% on a 1% rise, buys 30% on a 1% fall.
    Balanced,
}

impl StrategyKind {
    /// All known strategies (useful for iteration).
    pub const ALL: &'static [StrategyKind] = &[
        StrategyKind::Aggressive,
        StrategyKind::Safe,
        StrategyKind::Balanced,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Aggressive => write!(f, "aggressive"),
            StrategyKind::Safe => write!(f, "safe"),
            StrategyKind::Balanced => write!(f, "balanced"),
        }
    }
}

/// Attempt to parse a string into a StrategyKind (case-insensitive).
impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(StrategyKind::Aggressive),
            "safe" => Ok(StrategyKind::Safe),
            "balanced" => Ok(StrategyKind::Balanced),
            _ => Err(anyhow::anyhow!("Unknown strategy: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Assets & balances
// ---------------------------------------------------------------------------

/// Assets the agent trades. KRW is the quote currency, BTC the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Krw,
    Btc,
}

impl Asset {
    /// Exchange currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Asset::Krw => "KRW",
            Asset::Btc => "BTC",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Balance snapshot fed into the strategy engine each iteration.
///
/// Absent balances are represented as zero; a zero balance simply fails
/// every order threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    pub krw: Decimal,
    pub btc: Decimal,
}

impl Balances {
    pub fn new(krw: Decimal, btc: Decimal) -> Self {
        Self { krw, btc }
    }
}

impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KRW {:.0}, BTC {:.6}", self.krw, self.btc)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// An order decision produced by the strategy engine.
///
/// Buys are expressed in quote currency (KRW to spend), sells in base
/// asset volume (BTC to sell) — the two shapes a market order takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Buy { quote_amount: Decimal },
    Sell { base_amount: Decimal },
}

impl OrderAction {
    /// Order side label for logging.
    pub fn side(&self) -> &'static str {
        match self {
            OrderAction::Buy { .. } => "buy",
            OrderAction::Sell { .. } => "sell",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Buy { quote_amount } => write!(f, "buy {quote_amount:.0} KRW"),
            OrderAction::Sell { base_amount } => write!(f, "sell {base_amount:.8} BTC"),
        }
    }
}

/// Receipt returned after an order is accepted by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub symbol: String,
    pub action: OrderAction,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for OrderReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.symbol, self.action, self.order_id,
        )
    }
}

// ---------------------------------------------------------------------------
// Loop events
// ---------------------------------------------------------------------------

/// Structured events emitted by the trading loop onto its event channel.
///
/// A separate consumer owns presentation (log lines, UI, …); the loop
/// itself never touches a presentation surface.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    Started {
        strategy: StrategyKind,
    },
    StrategySwitched {
        from: StrategyKind,
        to: StrategyKind,
    },
    OrderPlaced {
        strategy: StrategyKind,
        action: OrderAction,
        receipt: OrderReceipt,
    },
    OrderFailed {
        strategy: StrategyKind,
        action: OrderAction,
        reason: String,
    },
    IterationError {
        reason: String,
    },
    Stopped,
}

impl fmt::Display for LoopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopEvent::Started { strategy } => {
                write!(f, "trading started (strategy: {strategy})")
            }
            LoopEvent::StrategySwitched { from, to } => {
                write!(f, "strategy switched: {from} -> {to}")
            }
            LoopEvent::OrderPlaced { strategy, action, receipt } => {
                write!(f, "[{strategy}] {action} placed ({})", receipt.order_id)
            }
            LoopEvent::OrderFailed { strategy, action, reason } => {
                write!(f, "[{strategy}] {action} failed: {reason}")
            }
            LoopEvent::IterationError { reason } => {
                write!(f, "trade loop error: {reason}")
            }
            LoopEvent::Stopped => write!(f, "trading stopped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for AUTOBIT.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    /// `start()` precondition: no authenticated exchange client installed.
    #[error("No exchange client connected — connect before starting")]
    NotConnected,

    #[error("Exchange error ({exchange}): {message}")]
    Exchange { exchange: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
