use crate::error::AnalyticsError;
use crate::report::FactorReport;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Substituted for a zero risk denominator (0.0001).
pub const RATIO_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// A stateless calculator for deriving ranking factors from a NAV series.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating an agent's factors.
    ///
    /// # Arguments
    ///
    /// * `navs` - The agent's NAV values in chronological order.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `FactorReport` or an `AnalyticsError` when a
    /// NAV that would be used as a return denominator is not positive.
    pub fn calculate(&self, navs: &[Decimal]) -> Result<FactorReport, AnalyticsError> {
        validate_series(navs)?;

        if navs.len() < 2 {
            // Nothing to compound: the agent has no return yet.
            return Ok(FactorReport::flat(navs.len()));
        }

        let returns = periodic_returns(navs);
        let first = navs[0];
        let last = navs[navs.len() - 1];
        let roi = (last - first) / first;

        let sortino = self.calculate_sortino(&returns)?;
        let max_drawdown = max_drawdown_fraction(navs);
        let calmar = roi
            .checked_div(max_drawdown)
            .ok_or_else(|| AnalyticsError::Calculation("calmar".to_string()))?;
        let stability = self.calculate_stability(&returns)?;

        tracing::trace!(%roi, %sortino, %calmar, %stability, points = navs.len(), "Factors derived.");
        Ok(FactorReport {
            roi,
            sortino,
            calmar,
            stability,
            max_drawdown,
            history_length: navs.len(),
        })
    }

    /// Mean return over the downside deviation.
    ///
    /// With no losing periods the deviation is floored at `RATIO_FLOOR`. Losing
    /// periods with zero spread between them (e.g. a single loss) score zero.
    fn calculate_sortino(&self, returns: &[Decimal]) -> Result<Decimal, AnalyticsError> {
        let losses: Vec<Decimal> = returns
            .iter()
            .copied()
            .filter(|r| *r < Decimal::ZERO)
            .collect();

        let downside_deviation = if losses.is_empty() {
            RATIO_FLOOR
        } else {
            population_std_dev(&losses)?
        };

        if downside_deviation <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        mean(returns)
            .checked_div(downside_deviation)
            .ok_or_else(|| AnalyticsError::Calculation("sortino".to_string()))
    }

    /// Inverse of the volatility of returns, with the volatility floored at `RATIO_FLOOR`.
    fn calculate_stability(&self, returns: &[Decimal]) -> Result<Decimal, AnalyticsError> {
        let volatility = population_std_dev(returns)?;
        let volatility = if volatility > Decimal::ZERO {
            volatility
        } else {
            RATIO_FLOOR
        };

        Decimal::ONE
            .checked_div(volatility)
            .ok_or_else(|| AnalyticsError::Calculation("stability".to_string()))
    }
}

/// NAVs must be non-negative and the first one, the ROI base, positive.
fn validate_series(navs: &[Decimal]) -> Result<(), AnalyticsError> {
    for (index, &value) in navs.iter().enumerate() {
        let is_roi_base = index == 0 && navs.len() > 1;
        if value < Decimal::ZERO || (is_roi_base && value.is_zero()) {
            return Err(AnalyticsError::InvalidHistory { index, value });
        }
    }
    Ok(())
}

/// Simple returns between consecutive NAVs.
///
/// A period starting from a zero NAV has no return: the ledger re-anchors a
/// wiped-out agent at the start NAV, and that jump is not performance.
fn periodic_returns(navs: &[Decimal]) -> Vec<Decimal> {
    navs.windows(2)
        .filter(|w| !w[0].is_zero())
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// The largest `(peak - v) / peak` seen while scanning the series, at least `RATIO_FLOOR`.
fn max_drawdown_fraction(navs: &[Decimal]) -> Decimal {
    let mut peak = navs[0];
    let mut max_drawdown = RATIO_FLOOR;

    for &nav in navs {
        if nav > peak {
            peak = nav;
        }
        let drawdown = (peak - nav) / peak;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    max_drawdown
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// Population standard deviation (divides by N).
fn population_std_dev(values: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let mean = mean(values);
    let variance = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / Decimal::from(values.len());

    variance.sqrt().ok_or_else(|| {
        AnalyticsError::Calculation("square root of the return variance".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn calculate(navs: &[Decimal]) -> FactorReport {
        AnalyticsEngine::new().calculate(navs).unwrap()
    }

    #[test]
    fn test_short_series_is_flat() {
        assert_eq!(calculate(&[]), FactorReport::flat(0));
        assert_eq!(calculate(&[dec!(1000)]), FactorReport::flat(1));
    }

    #[test]
    fn test_never_losing_agent_uses_downside_floor() {
        let report = calculate(&[dec!(1000), dec!(1010), dec!(1030.2)]);
        assert_eq!(report.roi, dec!(0.0302));
        // mean return 0.015 over the 0.0001 floor
        assert_eq!(report.sortino.round_dp(10), dec!(150));
        assert_eq!(report.max_drawdown, RATIO_FLOOR);
        assert_eq!(report.calmar.round_dp(10), dec!(302));
        // volatility of [0.01, 0.02] is 0.005
        assert_eq!(report.stability.round_dp(6), dec!(200));
        assert_eq!(report.history_length, 3);
    }

    #[test]
    fn test_mixed_returns() {
        let report = calculate(&[dec!(1000), dec!(900), dec!(720), dec!(792)]);
        assert_eq!(report.roi, dec!(-0.208));
        // returns [-0.1, -0.2, 0.1]: mean -0.0667, downside deviation 0.05
        assert_eq!(report.sortino.round_dp(4), dec!(-1.3333));
        assert_eq!(report.max_drawdown, dec!(0.28));
        assert_eq!(report.calmar.round_dp(4), dec!(-0.7429));
        assert!(report.stability > Decimal::ZERO);
    }

    #[test]
    fn test_single_losing_period_scores_zero_sortino() {
        let report = calculate(&[dec!(1000), dec!(1100), dec!(990)]);
        assert_eq!(report.roi, dec!(-0.01));
        assert_eq!(report.sortino, Decimal::ZERO);
        assert_eq!(report.max_drawdown, dec!(0.1));
        assert_eq!(report.calmar, dec!(-0.1));
        assert_eq!(report.stability.round_dp(6), dec!(10));
    }

    #[test]
    fn test_flat_series_uses_volatility_floor() {
        let report = calculate(&[dec!(1000), dec!(1000), dec!(1000)]);
        assert_eq!(report.roi, Decimal::ZERO);
        assert_eq!(report.sortino, Decimal::ZERO);
        assert_eq!(report.calmar, Decimal::ZERO);
        assert_eq!(report.stability, dec!(10000));
    }

    #[test]
    fn test_rejects_unusable_navs() {
        let engine = AnalyticsEngine::new();
        assert_eq!(
            engine.calculate(&[dec!(0), dec!(1000)]),
            Err(AnalyticsError::InvalidHistory {
                index: 0,
                value: dec!(0)
            })
        );
        assert!(matches!(
            engine.calculate(&[dec!(1000), dec!(-5)]),
            Err(AnalyticsError::InvalidHistory { index: 1, .. })
        ));
    }

    #[test]
    fn test_reanchored_history_skips_return_from_zero() {
        // Wiped out on day 3, re-anchored at 1000 on day 4.
        let navs = [
            dec!(1000),
            dec!(1500),
            dec!(0),
            dec!(1000),
            dec!(1100),
            dec!(1200),
            dec!(1300),
            dec!(1400),
        ];
        let report = calculate(&navs);

        assert_eq!(report.roi, dec!(0.4));
        assert_eq!(report.max_drawdown, dec!(1));
        assert_eq!(report.history_length, 8);
        // returns [0.5, -1, 0.1, ...]: one loss, so zero downside spread
        assert_eq!(report.sortino, Decimal::ZERO);
        assert!(report.stability > Decimal::ZERO);

        let without_reset = [dec!(1000), dec!(1500), dec!(0)];
        assert_eq!(periodic_returns(&without_reset), vec![dec!(0.5), dec!(-1)]);
        assert_eq!(periodic_returns(&navs).len(), 6);
    }

    #[test]
    fn test_wiped_out_agent_still_scores() {
        let report = calculate(&[dec!(1000), dec!(0)]);
        assert_eq!(report.roi, dec!(-1));
        assert_eq!(report.max_drawdown, dec!(1));
    }
}
