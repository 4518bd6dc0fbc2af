use crate::error::ApiError;
use crate::responses::{ClearinghouseState, LighterAccountsResponse};
use async_trait::async_trait;
use configuration::settings::{AgentConfig, ApiConfig, SourceConfig};
use core_types::{AgentStatus, valuation_from_f64};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod error;
pub mod responses;

/// What a venue reports about an agent's account at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueSnapshot {
    /// The account's net worth (collateral or account value).
    pub valuation: Decimal,
    /// Profit/loss as reported by the venue. Informational only.
    pub pnl: Option<Decimal>,
    pub status: AgentStatus,
    pub positions: usize,
}

/// The generic, abstract interface for anything that can value an agent's account.
/// The updater only sees this trait, so a live venue and a manual figure are
/// interchangeable (and tests can supply their own).
#[async_trait]
pub trait ValuationSource: Send + Sync {
    /// Short name used in logs.
    fn venue(&self) -> &'static str;

    /// Fetches the account's current valuation.
    async fn fetch_valuation(&self) -> Result<VenueSnapshot, ApiError>;
}

fn http_client(api_config: &ApiConfig) -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(api_config.request_timeout_secs))
        .build()?)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::InvalidData(format!(
            "HTTP {}: {}",
            status,
            text.trim()
        )));
    }

    serde_json::from_str::<T>(&text).map_err(|e| {
        ApiError::Deserialization(format!("{}. Response body: {}", e, text))
    })
}

/// Reads a Lighter perpetuals account, valued by its collateral.
#[derive(Clone)]
pub struct LighterClient {
    client: reqwest::Client,
    base_url: String,
    account_index: u64,
}

impl LighterClient {
    pub fn new(api_config: &ApiConfig, account_index: u64) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client(api_config)?,
            base_url: api_config.lighter_base_url.trim_end_matches('/').to_string(),
            account_index,
        })
    }
}

#[async_trait]
impl ValuationSource for LighterClient {
    fn venue(&self) -> &'static str {
        "lighter"
    }

    async fn fetch_valuation(&self) -> Result<VenueSnapshot, ApiError> {
        let url = format!("{}/account", self.base_url);
        let index = self.account_index.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("by", "index"), ("value", index.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!(
                "Lighter account {}",
                self.account_index
            )));
        }

        let body: LighterAccountsResponse = decode(response).await?;
        let account = body.accounts.into_iter().next().ok_or_else(|| {
            ApiError::NotFound(format!("Lighter account {}", self.account_index))
        })?;

        let snapshot = account.into_snapshot();
        tracing::debug!(
            account = self.account_index,
            collateral = %snapshot.valuation,
            positions = snapshot.positions,
            "Fetched Lighter account."
        );
        Ok(snapshot)
    }
}

/// Reads a Hyperliquid wallet, valued by its margin-summary account value.
#[derive(Clone)]
pub struct HyperliquidClient {
    client: reqwest::Client,
    info_url: String,
    wallet: String,
}

impl HyperliquidClient {
    pub fn new(api_config: &ApiConfig, wallet: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client(api_config)?,
            info_url: api_config.hyperliquid_info_url.clone(),
            wallet: wallet.into(),
        })
    }
}

#[async_trait]
impl ValuationSource for HyperliquidClient {
    fn venue(&self) -> &'static str {
        "hyperliquid"
    }

    async fn fetch_valuation(&self) -> Result<VenueSnapshot, ApiError> {
        let payload = serde_json::json!({
            "type": "clearinghouseState",
            "user": self.wallet,
        });

        let response = self.client.post(&self.info_url).json(&payload).send().await?;

        // An unknown wallet comes back as `null` rather than an error status.
        let state: Option<ClearinghouseState> = decode(response).await?;
        let state = state.ok_or_else(|| ApiError::NotFound(format!("Hyperliquid wallet {}", self.wallet)))?;

        let snapshot = state.into_snapshot();
        tracing::debug!(
            wallet = %self.wallet,
            account_value = %snapshot.valuation,
            positions = snapshot.positions,
            "Fetched Hyperliquid clearinghouse state."
        );
        Ok(snapshot)
    }
}

/// A valuation supplied by the operator, for agents without an automated feed.
#[derive(Debug, Clone)]
pub struct ManualSource {
    valuation: Decimal,
}

impl ManualSource {
    pub fn new(valuation: Decimal) -> Self {
        Self { valuation }
    }

    /// Builds a source from a command-line figure, rejecting NaN and infinities.
    pub fn from_f64(value: f64) -> Result<Self, ApiError> {
        valuation_from_f64(value)
            .map(Self::new)
            .map_err(|e| ApiError::InvalidData(e.to_string()))
    }
}

#[async_trait]
impl ValuationSource for ManualSource {
    fn venue(&self) -> &'static str {
        "manual"
    }

    async fn fetch_valuation(&self) -> Result<VenueSnapshot, ApiError> {
        Ok(VenueSnapshot {
            valuation: self.valuation,
            pnl: None,
            status: if self.valuation > Decimal::ZERO {
                AgentStatus::Live
            } else {
                AgentStatus::Offline
            },
            positions: 0,
        })
    }
}

/// Builds the valuation source configured for an agent.
///
/// A `manual` figure, when given, overrides the configured venue. Agents with a
/// `manual` source must be given one.
pub fn build_source(
    agent: &AgentConfig,
    api_config: &ApiConfig,
    manual: Option<f64>,
) -> Result<Box<dyn ValuationSource>, ApiError> {
    if let Some(value) = manual {
        return Ok(Box::new(ManualSource::from_f64(value)?));
    }

    match &agent.source {
        SourceConfig::Lighter { account_index } => {
            Ok(Box::new(LighterClient::new(api_config, *account_index)?))
        }
        SourceConfig::Hyperliquid { wallet } => {
            Ok(Box::new(HyperliquidClient::new(api_config, wallet.clone())?))
        }
        SourceConfig::Manual => Err(ApiError::InvalidData(format!(
            "agent '{}' has a manual source; pass --valuation",
            agent.id
        ))),
    }
}
