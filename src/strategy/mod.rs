//! Strategy engine — pure decision logic, no I/O.
//!
//! Given the current price, a balance snapshot, and the engine-held state,
//! each strategy returns zero or one order action and updates the state.
//! The trading loop owns the state and performs all I/O around the engine.

pub mod aggressive;
pub mod balanced;
pub mod safe;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

use crate::types::{Balances, OrderAction, StrategyKind};

// ---------------------------------------------------------------------------
// Parameters (defaults are the production values)
// ---------------------------------------------------------------------------

/// Strategy thresholds and sizing fractions.
///
/// The `fee_headroom` multiplier reserves room for exchange fees and
/// slippage on market orders so a full-balance order cannot be rejected
/// for insufficient funds.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    /// Single-step drop that triggers an aggressive buy.
    pub drop_threshold: Decimal,
    /// Rolling-window rise that triggers a safe sell.
    pub rise_threshold: Decimal,
    /// Symmetric swing that triggers a balanced buy/sell.
    pub swing_threshold: Decimal,
    /// Minimum quote balance (KRW) required before any buy.
    pub min_quote_balance: Decimal,
    /// Minimum base balance (BTC) required before any sell.
    pub min_base_balance: Decimal,
    /// Fraction of an order amount kept back for fees/slippage.
    pub fee_headroom: Decimal,
    /// Fraction of the quote balance committed by an aggressive buy.
    pub aggressive_fraction: Decimal,
    /// Fraction of either balance committed by a balanced order.
    pub balanced_fraction: Decimal,
    /// Rolling price-history capacity used by the safe strategy.
    pub window: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            drop_threshold: dec!(0.01),
            rise_threshold: dec!(0.003),
            swing_threshold: dec!(0.01),
            min_quote_balance: dec!(10000),
            min_base_balance: dec!(0.0001),
            fee_headroom: dec!(0.995),
            aggressive_fraction: dec!(0.5),
            balanced_fraction: dec!(0.3),
            window: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine state
// ---------------------------------------------------------------------------

/// State carried between loop iterations.
///
/// Created fresh when trading starts and discarded when it stops; never
/// persisted. Switching strategies mid-run does not reset either field.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// Baseline price for the aggressive and balanced strategies.
    /// `Decimal::ZERO` means "not yet initialized".
    pub reference_price: Decimal,
    /// Ordered history of observed prices, oldest first. The safe strategy
    /// holds this at `StrategyParams::window` entries.
    pub price_history: VecDeque<Decimal>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Relative drop from `reference` down to `current`: `(ref - cur) / ref`.
/// Returns zero when the reference is unset (the zero sentinel).
pub fn drop_ratio(reference: Decimal, current: Decimal) -> Decimal {
    if reference.is_zero() {
        Decimal::ZERO
    } else {
        (reference - current) / reference
    }
}

/// Relative change from `start` to `end`: `(end - start) / start`.
/// Returns zero when the start price is zero.
pub fn change_ratio(start: Decimal, end: Decimal) -> Decimal {
    if start.is_zero() {
        Decimal::ZERO
    } else {
        (end - start) / start
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one iteration of the selected strategy.
///
/// Exactly one strategy runs per call; the match is exhaustive so adding a
/// variant to [`StrategyKind`] fails to compile until it is handled here.
pub fn evaluate(
    state: &mut EngineState,
    price: Decimal,
    balances: &Balances,
    strategy: StrategyKind,
    params: &StrategyParams,
) -> Option<OrderAction> {
    match strategy {
        StrategyKind::Aggressive => aggressive::evaluate(state, price, balances, params),
        StrategyKind::Safe => safe::evaluate(state, price, balances, params),
        StrategyKind::Balanced => balanced::evaluate(state, price, balances, params),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
