//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (exchange API keys) are referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub exchange: ExchangeConfig,
    pub paper: PaperConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Market symbol, e.g. "KRW-BTC".
    pub symbol: String,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    /// Strategy active at startup ("aggressive" | "safe" | "balanced").
    pub default_strategy: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub access_key_env: String,
    pub secret_key_env: String,
}

/// Starting balances for keyless (paper) runs.
#[derive(Debug, Deserialize, Clone)]
pub struct PaperConfig {
    pub krw: Decimal,
    pub btc: Decimal,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
