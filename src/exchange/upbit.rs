//! Upbit REST client.
//!
//! Prices come from the public ticker endpoint; balances and orders use the
//! authenticated endpoints. Upbit authenticates with a JWT per request:
//! an HS256-signed token whose payload carries the access key, a UUID nonce
//! and — when the request has parameters — the SHA-512 hex digest of the
//! url-encoded query string.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use tracing::debug;
use uuid::Uuid;

use super::{Credentials, ExchangeClient};
use crate::types::{Asset, OrderAction, OrderReceipt};

type HmacSha256 = Hmac<Sha256>;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.upbit.com";

pub struct UpbitClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl UpbitClient {
    /// Create an authenticated client.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Some(credentials),
        })
    }

    /// Create a price-only client (no credentials).
    ///
    /// Balance and order calls fail; the public ticker still works. Used
    /// as the price source behind the paper exchange.
    pub fn public(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Build the per-request JWT. `query` is the url-encoded query string
    /// of the request, when it has one.
    fn auth_token(&self, query: Option<&str>) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("Upbit credentials required for this call"))?;

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);

        let mut payload = serde_json::json!({
            "access_key": creds.access_key(),
            "nonce": Uuid::new_v4().to_string(),
        });
        if let Some(query) = query {
            let digest = Sha512::digest(query.as_bytes());
            payload["query_hash"] = hex::encode(digest).into();
            payload["query_hash_alg"] = "SHA512".into();
        }
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?);

        let signing_input = format!("{header}.{payload}");
        let mut mac = HmacSha256::new_from_slice(creds.secret_key().as_bytes())
            .map_err(|e| anyhow!("Invalid secret key: {e}"))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    async fn place_order(&self, params: &[(&str, String)]) -> Result<OrderResponse> {
        let query = build_query(params);
        let token = self.auth_token(Some(&query))?;
        let url = format!("{}/v1/orders?{query}", self.base_url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Upbit order request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Upbit order rejected ({status}): {body}");
        }

        resp.json::<OrderResponse>()
            .await
            .context("Failed to parse Upbit order response")
    }
}

#[async_trait]
impl ExchangeClient for UpbitClient {
    async fn current_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        let url = format!("{}/v1/ticker?markets={}", self.base_url, urlencoding::encode(symbol));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Upbit ticker request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Upbit ticker error ({status}): {body}");
        }

        let tickers: Vec<Ticker> = resp
            .json()
            .await
            .context("Failed to parse Upbit ticker response")?;

        Ok(tickers.first().map(|t| t.trade_price))
    }

    async fn balance(&self, asset: Asset) -> Result<Option<Decimal>> {
        let token = self.auth_token(None)?;
        let url = format!("{}/v1/accounts", self.base_url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Upbit accounts request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Upbit accounts error ({status}): {body}");
        }

        let accounts: Vec<Account> = resp
            .json()
            .await
            .context("Failed to parse Upbit accounts response")?;

        let balance = accounts
            .iter()
            .find(|a| a.currency == asset.code())
            .map(|a| {
                a.balance
                    .parse::<Decimal>()
                    .with_context(|| format!("Unparseable {asset} balance: {}", a.balance))
            })
            .transpose()?;

        debug!(asset = %asset, balance = ?balance, "Balance fetched");
        Ok(balance)
    }

    async fn buy_market(&self, symbol: &str, quote_amount: Decimal) -> Result<OrderReceipt> {
        let params = [
            ("market", symbol.to_string()),
            ("side", "bid".to_string()),
            ("price", quote_amount.normalize().to_string()),
            ("ord_type", "price".to_string()),
            ("identifier", Uuid::new_v4().to_string()),
        ];
        let order = self.place_order(&params).await?;
        Ok(OrderReceipt {
            order_id: order.uuid,
            symbol: symbol.to_string(),
            action: OrderAction::Buy { quote_amount },
            timestamp: chrono::Utc::now(),
        })
    }

    async fn sell_market(&self, symbol: &str, base_amount: Decimal) -> Result<OrderReceipt> {
        let params = [
            ("market", symbol.to_string()),
            ("side", "ask".to_string()),
            ("volume", base_amount.normalize().to_string()),
            ("ord_type", "market".to_string()),
            ("identifier", Uuid::new_v4().to_string()),
        ];
        let order = self.place_order(&params).await?;
        Ok(OrderReceipt {
            order_id: order.uuid,
            symbol: symbol.to_string(),
            action: OrderAction::Sell { base_amount },
            timestamp: chrono::Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "upbit"
    }
}

/// Url-encode request parameters in declaration order.
fn build_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Ticker {
    trade_price: Decimal,
}

/// Account entry from `/v1/accounts`. Upbit serialises balances as strings.
#[derive(Debug, Deserialize)]
struct Account {
    currency: String,
    balance: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    uuid: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
