use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The raw ranking factors of one agent, derived from its NAV series.
///
/// All values are fractions, not percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorReport {
    /// Total return from the first to the last NAV.
    pub roi: Decimal,
    /// Mean periodic return over the standard deviation of the losing periods.
    pub sortino: Decimal,
    /// ROI over the maximum drawdown.
    pub calmar: Decimal,
    /// Inverse volatility of the periodic returns.
    pub stability: Decimal,
    /// Largest peak-to-trough decline, floored like the Calmar denominator.
    pub max_drawdown: Decimal,
    /// Number of NAV points the factors were derived from.
    pub history_length: usize,
}

impl FactorReport {
    /// A zeroed report, used for series too short to have a return.
    pub fn flat(history_length: usize) -> Self {
        Self {
            roi: Decimal::ZERO,
            sortino: Decimal::ZERO,
            calmar: Decimal::ZERO,
            stability: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            history_length,
        }
    }
}
