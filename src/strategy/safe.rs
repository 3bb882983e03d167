//! Safe strategy — sell the full base balance on a slow rolling-window rise.
//!
//! Keeps the last `window` observed prices. Once the window is full, each
//! new price is compared against the evicted oldest one; a rise at or above
//! the threshold across the window sells the whole BTC balance.

use rust_decimal::Decimal;

use super::{change_ratio, EngineState, StrategyParams};
use crate::types::{Balances, OrderAction};

pub(super) fn evaluate(
    state: &mut EngineState,
    price: Decimal,
    balances: &Balances,
    params: &StrategyParams,
) -> Option<OrderAction> {
    state.price_history.push_back(price);

    // The window only produces a signal once it has more than `window`
    // samples; until then it is still filling.
    if state.price_history.len() <= params.window {
        return None;
    }

    if let Some(start) = state.price_history.pop_front() {
        let change = change_ratio(start, price);
        if change >= params.rise_threshold && balances.btc > params.min_base_balance {
            return Some(OrderAction::Sell {
                base_amount: balances.btc * params.fee_headroom,
            });
        }
    }

    None
}
