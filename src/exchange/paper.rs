//! Paper exchange — simulated balances and fills.
//!
//! Wraps a real price source (any `ExchangeClient`) and simulates the
//! account side in memory: orders fill immediately at the last observed
//! price, balances move accordingly, and receipts are recorded. Used when
//! no API keys are configured, and by tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use super::ExchangeClient;
use crate::types::{Asset, Balances, OrderAction, OrderReceipt};

pub struct PaperExchange {
    prices: Arc<dyn ExchangeClient>,
    balances: Mutex<Balances>,
    /// Last price seen through `current_price`; fills happen at this price.
    last_price: Mutex<Decimal>,
    receipts: Mutex<Vec<OrderReceipt>>,
}

impl PaperExchange {
    pub fn new(prices: Arc<dyn ExchangeClient>, krw: Decimal, btc: Decimal) -> Self {
        Self {
            prices,
            balances: Mutex::new(Balances::new(krw, btc)),
            last_price: Mutex::new(Decimal::ZERO),
            receipts: Mutex::new(Vec::new()),
        }
    }

    /// Current simulated balances.
    pub fn balances(&self) -> Balances {
        *self.balances.lock().expect("paper balances lock poisoned")
    }

    /// All receipts recorded so far.
    pub fn receipts(&self) -> Vec<OrderReceipt> {
        self.receipts.lock().expect("paper receipts lock poisoned").clone()
    }

    fn record(&self, symbol: &str, action: OrderAction) -> OrderReceipt {
        let receipt = OrderReceipt {
            order_id: format!("paper-{}", Uuid::new_v4()),
            symbol: symbol.to_string(),
            action,
            timestamp: chrono::Utc::now(),
        };
        self.receipts
            .lock()
            .expect("paper receipts lock poisoned")
            .push(receipt.clone());
        receipt
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn current_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        let price = self.prices.current_price(symbol).await?;
        if let Some(price) = price {
            *self.last_price.lock().expect("paper price lock poisoned") = price;
        }
        Ok(price)
    }

    async fn balance(&self, asset: Asset) -> Result<Option<Decimal>> {
        let balances = self.balances();
        Ok(Some(match asset {
            Asset::Krw => balances.krw,
            Asset::Btc => balances.btc,
        }))
    }

    async fn buy_market(&self, symbol: &str, quote_amount: Decimal) -> Result<OrderReceipt> {
        let price = *self.last_price.lock().expect("paper price lock poisoned");
        if price.is_zero() {
            bail!("Paper fill impossible: no price observed yet");
        }

        {
            let mut balances = self.balances.lock().expect("paper balances lock poisoned");
            if balances.krw < quote_amount {
                bail!(
                    "Insufficient KRW: need {quote_amount:.0}, have {:.0}",
                    balances.krw
                );
            }
            balances.krw -= quote_amount;
            balances.btc += quote_amount / price;
        }

        let receipt = self.record(symbol, OrderAction::Buy { quote_amount });
        info!(fill_price = %price, "Paper buy filled");
        Ok(receipt)
    }

    async fn sell_market(&self, symbol: &str, base_amount: Decimal) -> Result<OrderReceipt> {
        let price = *self.last_price.lock().expect("paper price lock poisoned");
        if price.is_zero() {
            bail!("Paper fill impossible: no price observed yet");
        }

        {
            let mut balances = self.balances.lock().expect("paper balances lock poisoned");
            if balances.btc < base_amount {
                bail!(
                    "Insufficient BTC: need {base_amount:.8}, have {:.8}",
                    balances.btc
                );
            }
            balances.btc -= base_amount;
            balances.krw += base_amount * price;
        }

        let receipt = self.record(symbol, OrderAction::Sell { base_amount });
        info!(fill_price = %price, "Paper sell filled");
        Ok(receipt)
    }

    fn name(&self) -> &str {
        "paper"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
