//! End-to-end trading loop scenarios against the mock exchange.
//!
//! These drive the real `Trader` with millisecond pacing and scripted
//! price sequences, then assert on the receipts and events produced.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::sleep;

use autobit::engine::selector::StrategySelector;
use autobit::engine::trader::{Trader, TraderConfig};
use autobit::types::{LoopEvent, OrderAction, StrategyKind};

use crate::mock_exchange::MockExchange;

fn test_config() -> TraderConfig {
    TraderConfig {
        symbol: "KRW-BTC".to_string(),
        poll_interval: Duration::from_millis(3),
        error_backoff: Duration::from_millis(3),
    }
}

fn setup(
    strategy: StrategyKind,
    script: Vec<Decimal>,
    krw: Decimal,
    btc: Decimal,
) -> (Trader, Arc<MockExchange>, StrategySelector, UnboundedReceiver<LoopEvent>) {
    let mock = Arc::new(MockExchange::new(script, krw, btc));
    let selector = StrategySelector::new(strategy);
    let (tx, rx) = mpsc::unbounded_channel();
    let mut trader = Trader::new(test_config(), selector.clone(), tx);
    trader.connect(mock.clone());
    (trader, mock, selector, rx)
}

fn drain(rx: &mut UnboundedReceiver<LoopEvent>) -> Vec<LoopEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn test_aggressive_buys_into_a_falling_market() {
    let (mut trader, mock, _, _rx) = setup(
        StrategyKind::Aggressive,
        vec![dec!(100), dec!(99), dec!(98)],
        dec!(1000000),
        Decimal::ZERO,
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(60)).await;
    trader.stop().await;

    let receipts = mock.receipts();
    assert!(receipts.len() >= 2, "expected buys on both 1% steps: {receipts:?}");

    // First buy: half the full balance, less fee headroom.
    assert_eq!(
        receipts[0].action,
        OrderAction::Buy { quote_amount: dec!(497500) }
    );
    // Second buy: half of what remained after the first.
    assert_eq!(
        receipts[1].action,
        OrderAction::Buy { quote_amount: dec!(249993.75) }
    );
    // The flat tail of the script must not keep buying.
    assert_eq!(receipts.len(), 2);
}

#[tokio::test]
async fn test_aggressive_thin_balance_never_buys() {
    // 5% drops, but only 5 000 KRW — under the 10 000 floor.
    let (mut trader, mock, _, _rx) = setup(
        StrategyKind::Aggressive,
        vec![dec!(100), dec!(95), dec!(90), dec!(85)],
        dec!(5000),
        Decimal::ZERO,
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(60)).await;
    trader.stop().await;

    assert!(mock.receipts().is_empty());
}

#[tokio::test]
async fn test_safe_sells_after_slow_rise_across_window() {
    // Thirty samples at 100, then 100.5: a 0.5% rise over the full window.
    let mut script = vec![dec!(100); 30];
    script.push(dec!(100.5));

    let (mut trader, mock, _, _rx) = setup(
        StrategyKind::Safe,
        script,
        Decimal::ZERO,
        dec!(0.5),
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(250)).await;
    trader.stop().await;

    let receipts = mock.receipts();
    assert!(!receipts.is_empty(), "window rise must trigger a sell");
    assert_eq!(
        receipts[0].action,
        OrderAction::Sell { base_amount: dec!(0.4975) }
    );
    assert!(receipts.iter().all(|r| r.action.side() == "sell"));
}

#[tokio::test]
async fn test_balanced_sell_resets_reference() {
    // +1% fires a sell and moves the reference to 101; the further rise to
    // 101.5 is under 1% against the new reference and the dip to 100.2 is
    // under 1% the other way — exactly one order in total.
    let (mut trader, mock, _, _rx) = setup(
        StrategyKind::Balanced,
        vec![dec!(100), dec!(101), dec!(101.5), dec!(100.2)],
        dec!(1000000),
        dec!(0.5),
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(80)).await;
    trader.stop().await;

    let receipts = mock.receipts();
    assert_eq!(receipts.len(), 1, "{receipts:?}");
    assert_eq!(
        receipts[0].action,
        OrderAction::Sell { base_amount: dec!(0.14925) }
    );
}

#[tokio::test]
async fn test_balanced_reference_resets_even_when_order_fails() {
    let (mut trader, mock, _, mut rx) = setup(
        StrategyKind::Balanced,
        vec![dec!(100), dec!(101), dec!(101.5)],
        dec!(1000000),
        dec!(0.5),
    );
    mock.set_reject_orders(true);

    trader.start().unwrap();
    sleep(Duration::from_millis(60)).await;
    trader.stop().await;

    // One rejected sell at 101; had the reference not moved, 101.5 against
    // 100 would have produced a second signal.
    let events = drain(&mut rx);
    let failures = events
        .iter()
        .filter(|e| matches!(
            e,
            LoopEvent::OrderFailed { strategy: StrategyKind::Balanced, .. }
        ))
        .count();
    assert_eq!(failures, 1, "{events:?}");
    assert!(mock.receipts().is_empty());
}

#[tokio::test]
async fn test_outage_backs_off_then_recovers() {
    let (mut trader, mock, _, mut rx) = setup(
        StrategyKind::Safe,
        vec![dec!(100)],
        Decimal::ZERO,
        Decimal::ZERO,
    );
    mock.set_error("exchange maintenance");

    trader.start().unwrap();
    sleep(Duration::from_millis(40)).await;

    // Still alive and erroring; nothing has reached the price counter.
    assert_eq!(mock.price_calls(), 0);

    mock.clear_error();
    sleep(Duration::from_millis(40)).await;
    trader.stop().await;

    let events = drain(&mut rx);
    let errors = events
        .iter()
        .filter(|e| matches!(e, LoopEvent::IterationError { .. }))
        .count();
    assert!(errors >= 2, "outage iterations must surface as events: {events:?}");
    assert!(mock.price_calls() >= 1, "loop must resume fetching after the outage");
}

#[tokio::test]
async fn test_stop_joins_and_goes_quiet() {
    let (mut trader, mock, _, mut rx) = setup(
        StrategyKind::Safe,
        vec![dec!(100)],
        Decimal::ZERO,
        dec!(0.5),
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(30)).await;
    trader.stop().await;

    // Everything the loop will ever emit is already in the channel.
    drain(&mut rx);
    let calls_at_stop = mock.price_calls();

    sleep(Duration::from_millis(40)).await;
    assert!(drain(&mut rx).is_empty(), "no events may arrive after stop returns");
    assert_eq!(mock.price_calls(), calls_at_stop, "no iterations after stop returns");
}

#[tokio::test]
async fn test_live_strategy_switch_changes_behavior() {
    // Start under Safe (which never buys); switch to Aggressive while the
    // price is still flat, then a 2% drop arrives and the loop must buy.
    let mut script = vec![dec!(100); 12];
    script.push(dec!(98));
    let (mut trader, mock, selector, mut rx) = setup(
        StrategyKind::Safe,
        script,
        dec!(1000000),
        Decimal::ZERO,
    );

    trader.start().unwrap();
    sleep(Duration::from_millis(10)).await;
    selector.select(StrategyKind::Aggressive);
    sleep(Duration::from_millis(60)).await;
    trader.stop().await;

    let events = drain(&mut rx);
    assert!(
        events.iter().any(|e| matches!(e, LoopEvent::StrategySwitched { .. })),
        "{events:?}"
    );

    let receipts = mock.receipts();
    assert!(
        receipts.iter().any(|r| r.action.side() == "buy"),
        "aggressive must act on the drop after the switch: {receipts:?}"
    );
}
