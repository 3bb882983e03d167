//! Aggressive strategy — buy half the quote balance on a single-step drop.
//!
//! The reference price tracks the latest observed price unconditionally, so
//! the drop is always measured against the previous tick rather than held
//! across a decline.

use rust_decimal::Decimal;

use super::{drop_ratio, EngineState, StrategyParams};
use crate::types::{Balances, OrderAction};

pub(super) fn evaluate(
    state: &mut EngineState,
    price: Decimal,
    balances: &Balances,
    params: &StrategyParams,
) -> Option<OrderAction> {
    if state.reference_price.is_zero() {
        state.reference_price = price;
    }

    let drop = drop_ratio(state.reference_price, price);

    let action = if drop >= params.drop_threshold && balances.krw > params.min_quote_balance {
        Some(OrderAction::Buy {
            quote_amount: balances.krw * params.aggressive_fraction * params.fee_headroom,
        })
    } else {
        None
    };

    // Reference follows the latest price whether or not a buy fired.
    state.reference_price = price;

    action
}
