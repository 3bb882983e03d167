//! Balanced strategy — symmetric, self-resetting swing trading.
//!
//! Sells 30% of the base balance on a 1% rise above the reference price and
//! buys with 30% of the quote balance on a 1% fall below it. The reference
//! only moves when a signal fires, so consecutive small moves in the same
//! direction accumulate until they cross the threshold.

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

    // Signed change relative to the reference: positive on a rise.
    let change = -drop_ratio(state.reference_price, price);

    if change >= params.swing_threshold && balances.btc > params.min_base_balance {
        state.reference_price = price;
        Some(OrderAction::Sell {
            base_amount: balances.btc * params.balanced_fraction * params.fee_headroom,
        })
    } else if change <= -params.swing_threshold && balances.krw > params.min_quote_balance {
        state.reference_price = price;
        Some(OrderAction::Buy {
            quote_amount: balances.krw * params.balanced_fraction * params.fee_headroom,
        })
    } else {
        None
    }
}
