use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The agents being tracked, in display order.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// Where per-agent histories and the dashboard artifacts live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `live-data-<id>.json` and `equity-historical-<id>.json`.
    pub data_dir: PathBuf,
    /// The display-configuration artifact written by `rank --write-display-config`.
    pub display_config_path: PathBuf,
}

/// Policy for turning valuations into NAV points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// The NAV every agent starts at.
    pub start_nav: Decimal,
    /// Decimal places NAV values are rounded to before they are persisted.
    pub nav_decimal_places: u32,
    /// Valuations below this are rejected as implausible.
    pub min_plausible_valuation: Option<Decimal>,
    /// Valuations above this are rejected as implausible (e.g. a mis-decoded vault).
    pub max_plausible_valuation: Option<Decimal>,
}

/// Policy for the cross-agent SRS ranking.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Agents with fewer NAV points than this receive the new-entrant penalty.
    pub min_data_points: usize,
    /// Multiplier applied to a new entrant's internal score.
    pub new_entrant_penalty: Decimal,
    /// Weights for the scoring function. Must sum to 1.0.
    pub weights: Weights,
}

/// Weights for the four normalized ranking factors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub roi: Decimal,
    pub sortino: Decimal,
    pub calmar: Decimal,
    pub stability: Decimal,
}

/// Endpoints and timeouts for the venue valuation sources.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub lighter_base_url: String,
    pub hyperliquid_info_url: String,
    /// Per-request timeout. The only cancellation applied to a fetch.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// If set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

/// One tracked agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Venue label shown on the dashboard (e.g. "Lighter", "Hyperliquid").
    #[serde(default)]
    pub protocol: String,
    pub source: SourceConfig,
}

/// Which venue an agent's valuation is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A Lighter perpetuals account, valued by its collateral.
    Lighter { account_index: u64 },
    /// A Hyperliquid wallet, valued by its margin-summary account value.
    Hyperliquid { wallet: String },
    /// No automated feed; the valuation must be supplied on the command line.
    Manual,
}

fn default_color() -> String {
    "#ffffff".to_string()
}

// --- Default Implementations ---
// This allows a user to omit whole sections from their toml
// and still have it work with sensible defaults.

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("public/data"),
            display_config_path: PathBuf::from("public/data/strategies-config.json"),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            start_nav: dec!(1000),
            nav_decimal_places: 2,
            min_plausible_valuation: None,
            max_plausible_valuation: None,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_data_points: 7,
            new_entrant_penalty: dec!(0.2),
            weights: Weights::default(),
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            roi: dec!(0.3),
            sortino: dec!(0.3),
            calmar: dec!(0.3),
            stability: dec!(0.1),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            lighter_base_url: "https://mainnet.zklighter.elliot.ai/api/v1".to_string(),
            hyperliquid_info_url: "https://api.hyperliquid.xyz/info".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Weights {
    pub fn total(&self) -> Decimal {
        self.roi + self.sortino + self.calmar + self.stability
    }
}

impl Config {
    /// Parses a configuration from TOML text. Environment overrides are not applied.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn agent(&self, id: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Checks the cross-field rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.start_nav <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "ledger.start_nav must be positive, got {}",
                self.ledger.start_nav
            )));
        }

        if let (Some(min), Some(max)) = (
            self.ledger.min_plausible_valuation,
            self.ledger.max_plausible_valuation,
        ) {
            if min > max {
                return Err(ConfigError::ValidationError(format!(
                    "ledger.min_plausible_valuation ({}) exceeds max_plausible_valuation ({})",
                    min, max
                )));
            }
        }

        let penalty = self.ranking.new_entrant_penalty;
        if penalty < Decimal::ZERO || penalty > Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "ranking.new_entrant_penalty must be within [0, 1], got {}",
                penalty
            )));
        }

        let w = &self.ranking.weights;
        if [w.roi, w.sortino, w.calmar, w.stability]
            .iter()
            .any(|weight| weight.is_sign_negative())
        {
            return Err(ConfigError::ValidationError(
                "ranking.weights must not be negative".to_string(),
            ));
        }
        if (w.total() - Decimal::ONE).abs() > dec!(0.000001) {
            return Err(ConfigError::ValidationError(format!(
                "ranking.weights must sum to 1.0, got {}",
                w.total()
            )));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "agent ids must not be empty".to_string(),
                ));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "agent id '{}' is configured more than once",
                    agent.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
        [storage]
        data_dir = "data"

        [ledger]
        max_plausible_valuation = 5000000

        [ranking]
        min_data_points = 5
        weights = { roi = 0.25, sortino = 0.25, calmar = 0.25, stability = 0.25 }

        [[agents]]
        id = "sentquant"
        name = "Sentquant"
        color = "#f3f4f5"
        protocol = "Lighter"
        source = { kind = "lighter", account_index = 505549 }

        [[agents]]
        id = "systemic_hyper"
        name = "Systemic Hyper"
        protocol = "Hyperliquid"
        source = { kind = "hyperliquid", wallet = "0xd6e56265890b76413d1d527eb9b75e334c0c5b42" }

        [[agents]]
        id = "jlp_neutral"
        name = "JLP Delta Neutral"
        source = { kind = "manual" }
    "##;

    #[test]
    fn test_parses_sample_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.ledger.start_nav, dec!(1000));
        assert_eq!(config.ledger.max_plausible_valuation, Some(dec!(5000000)));
        assert_eq!(config.ranking.min_data_points, 5);
        assert_eq!(config.ranking.new_entrant_penalty, dec!(0.2));
        assert_eq!(config.ranking.weights.stability, dec!(0.25));
        assert_eq!(config.agents.len(), 3);
        assert_eq!(
            config.agent("sentquant").unwrap().source,
            SourceConfig::Lighter {
                account_index: 505549
            }
        );
        assert_eq!(config.agent("jlp_neutral").unwrap().color, "#ffffff");
        assert_eq!(config.agent("jlp_neutral").unwrap().source, SourceConfig::Manual);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.ranking.weights.total(), Decimal::ONE);
        assert_eq!(config.ledger.nav_decimal_places, 2);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert!(config.agents.is_empty());
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let toml = r#"
            [ranking]
            weights = { roi = 0.5, sortino = 0.3, calmar = 0.3, stability = 0.1 }
        "#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_duplicate_agent_ids() {
        let toml = r#"
            [[agents]]
            id = "a"
            name = "A"
            source = { kind = "manual" }

            [[agents]]
            id = "a"
            name = "A again"
            source = { kind = "manual" }
        "#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_inverted_plausibility_bounds() {
        let toml = r#"
            [ledger]
            min_plausible_valuation = 10
            max_plausible_valuation = 5
        "#;
        assert!(Config::from_toml_str(toml).is_err());
    }
}
