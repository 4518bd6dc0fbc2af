use crate::error::LedgerError;
use configuration::LedgerConfig;
use core_types::{AgentHistory, NavPoint, Observation};
pub use core_types::recompute_drawdowns;
use rust_decimal::Decimal;

/// Applies the NAV policy to incoming observations.
///
/// The ledger is stateless apart from its policy; one instance can serve every
/// agent, but callers must serialize ingests for the same agent.
#[derive(Debug, Clone)]
pub struct NavLedger {
    config: LedgerConfig,
}

impl NavLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Ingests one observation and returns the updated, drawdown-annotated history.
    ///
    /// A second observation on the latest date replaces that date's point. An
    /// observation dated before the latest point is rejected, as is any history
    /// that is not strictly date-ordered.
    pub fn ingest(
        &self,
        history: &AgentHistory,
        observation: &Observation,
    ) -> Result<AgentHistory, LedgerError> {
        self.validate_observation(observation)?;

        if let Some(index) = history.first_order_violation() {
            return Err(LedgerError::UnsortedHistory {
                agent_id: observation.agent_id.clone(),
                index,
                date: history.points()[index].date,
            });
        }

        let date = observation.date();
        let mut updated = history.clone();

        if let Some(last) = updated.last() {
            if date < last.date {
                return Err(LedgerError::InvalidObservation {
                    agent_id: observation.agent_id.clone(),
                    reason: format!(
                        "observed on {}, before the latest recorded point ({})",
                        date, last.date
                    ),
                });
            }
            if date == last.date {
                tracing::warn!(agent = %observation.agent_id, %date, "Data for this date already exists. Replacing it.");
                updated.pop();
            }
        }

        let (previous_nav, previous_valuation) = match updated.last() {
            Some(last) => (last.nav, last.valuation),
            // The first point starts flat: its own valuation is the baseline.
            None => (self.config.start_nav, observation.valuation),
        };

        let nav = derive_nav(
            previous_nav,
            previous_valuation,
            observation.valuation,
            self.config.start_nav,
        )
        .ok_or_else(|| LedgerError::InvalidObservation {
            agent_id: observation.agent_id.clone(),
            reason: format!(
                "valuation {} overflows the NAV derived from {} at NAV {}",
                observation.valuation, previous_valuation, previous_nav
            ),
        })?
        .round_dp(self.config.nav_decimal_places);

        let mut point = NavPoint::new(observation.observed_at, nav, observation.valuation);
        point.pnl = observation.pnl;
        updated.push(point);

        recompute_drawdowns(updated.points_mut());

        tracing::debug!(
            agent = %observation.agent_id,
            %date,
            %nav,
            points = updated.len(),
            "Observation ingested."
        );
        Ok(updated)
    }

    fn validate_observation(&self, observation: &Observation) -> Result<(), LedgerError> {
        let valuation = observation.valuation;
        if valuation < Decimal::ZERO {
            return Err(LedgerError::InvalidObservation {
                agent_id: observation.agent_id.clone(),
                reason: format!("valuation {} is negative", valuation),
            });
        }

        let min = self.config.min_plausible_valuation;
        let max = self.config.max_plausible_valuation;
        let below = min.is_some_and(|m| valuation < m);
        let above = max.is_some_and(|m| valuation > m);
        if below || above {
            return Err(LedgerError::ImplausibleValuation {
                agent_id: observation.agent_id.clone(),
                valuation,
                min: min.map_or_else(|| "unbounded".to_string(), |m| m.to_string()),
                max: max.map_or_else(|| "unbounded".to_string(), |m| m.to_string()),
            });
        }

        Ok(())
    }
}

/// Derives the next NAV by proportional growth: `previous_nav * (current / previous)`.
///
/// A non-positive previous valuation or NAV resets the index to `start_nav`.
/// Without the NAV check, a NAV that rounded to zero would stay there forever.
/// Returns `None` only if the result overflows.
pub fn derive_nav(
    previous_nav: Decimal,
    previous_valuation: Decimal,
    current_valuation: Decimal,
    start_nav: Decimal,
) -> Option<Decimal> {
    if previous_valuation <= Decimal::ZERO || previous_nav <= Decimal::ZERO {
        return Some(start_nav);
    }
    let growth = current_valuation.checked_div(previous_valuation)?;
    previous_nav.checked_mul(growth)
}
