//! Exchange integrations.
//!
//! Defines the `ExchangeClient` trait and provides implementations for:
//! - Upbit — real-money execution via the REST API (JWT-authenticated)
//! - Paper — in-memory simulated balances and fills for keyless runs

pub mod paper;
pub mod upbit;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};

use crate::types::{Asset, OrderReceipt};

/// Exchange API credentials.
///
/// Keys are wrapped in `Secret` so they never appear in Debug output
/// or log lines.
pub struct Credentials {
    access_key: Secret<String>,
    secret_key: Secret<String>,
}

impl Credentials {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key: Secret::new(access_key),
            secret_key: Secret::new(secret_key),
        }
    }

    pub(crate) fn access_key(&self) -> &str {
        self.access_key.expose_secret()
    }

    pub(crate) fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

/// Abstraction over spot exchanges.
///
/// `Ok(None)` from the read operations means "absent" — no ticker for the
/// symbol, or no holdings for the asset — and callers degrade it to zero.
/// `Err` is a transport/authentication failure and is left to the caller's
/// iteration-level error handling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch the latest traded price for a symbol.
    async fn current_price(&self, symbol: &str) -> Result<Option<Decimal>>;

    /// Fetch the available balance for an asset.
    async fn balance(&self, asset: Asset) -> Result<Option<Decimal>>;

    /// Place a market buy spending `quote_amount` of the quote currency.
    async fn buy_market(&self, symbol: &str, quote_amount: Decimal) -> Result<OrderReceipt>;

    /// Place a market sell of `base_amount` of the base asset.
    async fn sell_market(&self, symbol: &str, base_amount: Decimal) -> Result<OrderReceipt>;

    /// Exchange name for logging and identification.
    fn name(&self) -> &str;
}
