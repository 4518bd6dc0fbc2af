use crate::error::AnalyzerError;
use analytics::{AnalyticsEngine, FactorReport};
use configuration::RankingConfig;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::cmp::Ordering;

pub mod error;

/// Added to every normalization range so a cohort with identical values
/// normalizes to zero instead of dividing by zero (1e-9).
pub const NORMALIZATION_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

const SRS_BASE: Decimal = Decimal::ONE_HUNDRED;
const SRS_SPAN: Decimal = Decimal::from_parts(900, 0, 0, false, 0);

/// One agent's NAV series, as read from its persisted history.
#[derive(Debug, Clone)]
pub struct AgentNavs {
    pub agent_id: String,
    pub navs: Vec<Decimal>,
}

impl AgentNavs {
    pub fn new(agent_id: impl Into<String>, navs: Vec<Decimal>) -> Self {
        Self {
            agent_id: agent_id.into(),
            navs,
        }
    }
}

/// The four factors after min-max normalization against the cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFactors {
    pub roi: Decimal,
    pub sortino: Decimal,
    pub calmar: Decimal,
    pub stability: Decimal,
}

/// An agent's raw factors, its normalized scores and its final position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAgent {
    pub rank: usize,
    pub agent_id: String,
    #[serde(flatten)]
    pub factors: FactorReport,
    pub normalized: NormalizedFactors,
    /// Weighted composite before the new-entrant penalty.
    pub base_score: Decimal,
    /// Weighted composite after the new-entrant penalty. The primary sort key.
    pub internal_score: Decimal,
    /// The integer display score, `floor(100 + internal_score * 900)`.
    pub srs: i64,
    pub penalized: bool,
}

/// An agent left out of the ranking, and why.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAgent {
    pub agent_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RankingOutcome {
    pub ranked: Vec<RankedAgent>,
    pub skipped: Vec<SkippedAgent>,
}

/// The main ranking engine.
pub struct Analyzer {
    config: RankingConfig,
    analytics: AnalyticsEngine,
}

impl Analyzer {
    pub fn new(config: RankingConfig) -> Self {
        Self {
            config,
            analytics: AnalyticsEngine::new(),
        }
    }

    /// Derives, normalizes, scores and orders a cohort of agents.
    ///
    /// An agent whose history cannot be scored is skipped with a warning; the
    /// rest of the cohort is still ranked. The input order is the final tie-break.
    pub fn rank(&self, cohort: &[AgentNavs]) -> RankingOutcome {
        let mut reports = Vec::with_capacity(cohort.len());
        let mut skipped = Vec::new();

        // 1. Derive raw factors
        for agent in cohort {
            match self.analytics.calculate(&agent.navs) {
                Ok(report) => reports.push((agent.agent_id.clone(), report)),
                Err(source) => {
                    let err = AnalyzerError::InvalidHistory {
                        agent_id: agent.agent_id.clone(),
                        source,
                    };
                    tracing::warn!(agent = %agent.agent_id, error = %err, "Excluding agent from ranking.");
                    skipped.push(SkippedAgent {
                        agent_id: agent.agent_id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        // 2-4. Normalize, score, rank
        let ranked = self.rank_reports(reports);
        tracing::info!(ranked = ranked.len(), skipped = skipped.len(), "Ranking complete.");

        RankingOutcome { ranked, skipped }
    }

    /// Scores and orders agents whose raw factors are already known.
    pub fn rank_reports(&self, reports: Vec<(String, FactorReport)>) -> Vec<RankedAgent> {
        if reports.is_empty() {
            return vec![];
        }

        let mut ranked = self.score_reports(reports);

        // Score, then raw return, then seniority. `sort_by` is stable, so the
        // input order settles anything still tied.
        ranked.sort_by(|a, b| compare_for_rank(b, a));

        for (position, agent) in ranked.iter_mut().enumerate() {
            agent.rank = position + 1;
        }

        ranked
    }

    /// Normalizes and applies the weighted scoring function and the new-entrant penalty.
    fn score_reports(&self, reports: Vec<(String, FactorReport)>) -> Vec<RankedAgent> {
        // Find min/max for normalization
        let (min_roi, max_roi) = find_min_max(&reports, |r| r.roi);
        let (min_sortino, max_sortino) = find_min_max(&reports, |r| r.sortino);
        let (min_calmar, max_calmar) = find_min_max(&reports, |r| r.calmar);
        let (min_stability, max_stability) = find_min_max(&reports, |r| r.stability);

        let w = &self.config.weights;

        reports
            .into_iter()
            .map(|(agent_id, factors)| {
                let normalized = NormalizedFactors {
                    roi: normalize(factors.roi, min_roi, max_roi),
                    sortino: normalize(factors.sortino, min_sortino, max_sortino),
                    calmar: normalize(factors.calmar, min_calmar, max_calmar),
                    stability: normalize(factors.stability, min_stability, max_stability),
                };

                let base_score = (normalized.roi * w.roi)
                    + (normalized.sortino * w.sortino)
                    + (normalized.calmar * w.calmar)
                    + (normalized.stability * w.stability);

                let penalized = factors.history_length < self.config.min_data_points;
                let internal_score = if penalized {
                    base_score * self.config.new_entrant_penalty
                } else {
                    base_score
                };

                RankedAgent {
                    rank: 0,
                    agent_id,
                    factors,
                    normalized,
                    base_score,
                    internal_score,
                    srs: display_score(internal_score),
                    penalized,
                }
            })
            .collect()
    }
}

/// Orders by internal score, then ROI, then history length.
fn compare_for_rank(a: &RankedAgent, b: &RankedAgent) -> Ordering {
    a.internal_score
        .cmp(&b.internal_score)
        .then_with(|| a.factors.roi.cmp(&b.factors.roi))
        .then_with(|| a.factors.history_length.cmp(&b.factors.history_length))
}

/// Maps an internal score onto the display band: `floor(100 + score * 900)`. Not clamped.
pub fn display_score(internal_score: Decimal) -> i64 {
    (SRS_BASE + internal_score * SRS_SPAN)
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// A helper function to find the min and max of a specific factor across the cohort.
fn find_min_max<F>(reports: &[(String, FactorReport)], accessor: F) -> (Decimal, Decimal)
where
    F: Fn(&FactorReport) -> Decimal,
{
    reports
        .iter()
        .map(|(_, r)| accessor(r))
        .fold((Decimal::MAX, Decimal::MIN), |(min, max), val| {
            (min.min(val), max.max(val))
        })
}

/// Normalizes a value to a 0.0-1.0 scale relative to the cohort.
fn normalize(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    (value - min) / (max - min + NORMALIZATION_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn analyzer() -> Analyzer {
        Analyzer::new(RankingConfig::default())
    }

    fn report(
        roi: Decimal,
        sortino: Decimal,
        calmar: Decimal,
        stability: Decimal,
        history_length: usize,
    ) -> FactorReport {
        FactorReport {
            roi,
            sortino,
            calmar,
            stability,
            max_drawdown: dec!(0.1),
            history_length,
        }
    }

    fn compounding(start: Decimal, rate: Decimal, points: usize) -> Vec<Decimal> {
        let mut navs = vec![start];
        for _ in 1..points {
            let last = navs[navs.len() - 1];
            navs.push(last * (Decimal::ONE + rate));
        }
        navs
    }

    #[test]
    fn test_single_agent_scores_base_srs() {
        let outcome = analyzer().rank(&[AgentNavs::new(
            "solo",
            vec![dec!(1000), dec!(1100), dec!(1200)],
        )]);

        assert_eq!(outcome.ranked.len(), 1);
        let solo = &outcome.ranked[0];
        assert_eq!(solo.rank, 1);
        assert_eq!(solo.normalized.roi, Decimal::ZERO);
        assert_eq!(solo.normalized.stability, Decimal::ZERO);
        assert_eq!(solo.internal_score, Decimal::ZERO);
        assert_eq!(solo.srs, 100);
    }

    #[test]
    fn test_empty_cohort_ranks_nothing() {
        let outcome = analyzer().rank(&[]);
        assert!(outcome.ranked.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_new_entrant_penalty_drops_short_history() {
        let reports = vec![
            (
                "newcomer".to_string(),
                report(dec!(0.5), dec!(10), dec!(10), dec!(100), 3),
            ),
            (
                "veteran".to_string(),
                report(dec!(0.2), dec!(5), dec!(5), dec!(60), 30),
            ),
            (
                "laggard".to_string(),
                report(dec!(0), dec!(0), dec!(0), dec!(20), 30),
            ),
        ];

        let ranked = analyzer().rank_reports(reports);
        let order: Vec<&str> = ranked.iter().map(|r| r.agent_id.as_str()).collect();
        assert_eq!(order, vec!["veteran", "newcomer", "laggard"]);

        let newcomer = &ranked[1];
        assert!(newcomer.penalized);
        assert!(newcomer.base_score > dec!(0.99));
        assert_eq!(
            newcomer.internal_score,
            newcomer.base_score * dec!(0.2)
        );
        assert_eq!(newcomer.srs, 279);

        let veteran = &ranked[0];
        assert!(!veteran.penalized);
        assert_eq!(veteran.internal_score.round_dp(6), dec!(0.47));
    }

    #[test]
    fn test_ties_break_on_roi_then_seniority_then_input_order() {
        let reports = vec![
            ("junior".to_string(), report(dec!(0.1), dec!(1), dec!(1), dec!(1), 10)),
            ("senior".to_string(), report(dec!(0.1), dec!(1), dec!(1), dec!(1), 20)),
            ("twin_a".to_string(), report(dec!(0), dec!(0), dec!(0), dec!(0), 8)),
            ("twin_b".to_string(), report(dec!(0), dec!(0), dec!(0), dec!(0), 8)),
        ];

        let ranked = analyzer().rank_reports(reports);
        let order: Vec<&str> = ranked.iter().map(|r| r.agent_id.as_str()).collect();
        assert_eq!(order, vec!["senior", "junior", "twin_a", "twin_b"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_equal_score_breaks_on_roi() {
        // Only ROI differs, and it carries no weight, so the scores tie.
        let mut config = RankingConfig::default();
        config.weights.roi = Decimal::ZERO;
        config.weights.sortino = dec!(0.6);
        let analyzer = Analyzer::new(config);

        let reports = vec![
            ("low".to_string(), report(dec!(0.1), dec!(1), dec!(1), dec!(1), 10)),
            ("high".to_string(), report(dec!(0.2), dec!(1), dec!(1), dec!(1), 10)),
        ];

        let ranked = analyzer.rank_reports(reports);
        assert_eq!(ranked[0].internal_score, ranked[1].internal_score);
        assert_eq!(ranked[0].agent_id, "high");
    }

    #[test]
    fn test_consistent_grower_outranks_volatile_agent() {
        let cohort = vec![
            AgentNavs::new(
                "volatile",
                vec![
                    dec!(1000),
                    dec!(1100),
                    dec!(950),
                    dec!(1050),
                    dec!(980),
                    dec!(1020),
                    dec!(990),
                    dec!(1000),
                ],
            ),
            AgentNavs::new("steady", compounding(dec!(1000), dec!(0.01), 10)),
        ];

        let outcome = analyzer().rank(&cohort);
        assert_eq!(outcome.ranked[0].agent_id, "steady");
        assert_eq!(outcome.ranked[0].srs, 999);
        assert_eq!(outcome.ranked[1].agent_id, "volatile");
        assert_eq!(outcome.ranked[1].srs, 100);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let cohort = vec![
            AgentNavs::new("a", compounding(dec!(1000), dec!(0.01), 12)),
            AgentNavs::new("b", vec![dec!(1000), dec!(1200), dec!(900), dec!(1300)]),
            AgentNavs::new("c", vec![dec!(1000), dec!(990), dec!(1005), dec!(1001)]),
        ];

        let analyzer = analyzer();
        let first = serde_json::to_string(&analyzer.rank(&cohort)).unwrap();
        let second = serde_json::to_string(&analyzer.rank(&cohort)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_history_is_skipped_not_fatal() {
        let cohort = vec![
            AgentNavs::new("broken", vec![dec!(1000), dec!(-5), dec!(1000)]),
            AgentNavs::new("fine", vec![dec!(1000), dec!(1010)]),
        ];

        let outcome = analyzer().rank(&cohort);
        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(outcome.ranked[0].agent_id, "fine");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].agent_id, "broken");
        assert!(outcome.skipped[0].reason.contains("index 1"));
    }

    #[test]
    fn test_reanchored_agent_is_still_ranked() {
        let cohort = vec![
            AgentNavs::new(
                "wiped",
                vec![
                    dec!(1000),
                    dec!(1500),
                    dec!(0),
                    dec!(1000),
                    dec!(1100),
                    dec!(1200),
                    dec!(1300),
                    dec!(1400),
                ],
            ),
            AgentNavs::new("steady", compounding(dec!(1000), dec!(0.01), 8)),
        ];

        let outcome = analyzer().rank(&cohort);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.ranked.len(), 2);
        assert!(outcome.ranked.iter().any(|a| a.agent_id == "wiped"));
    }

    #[test]
    fn test_srs_is_not_clamped() {
        assert_eq!(display_score(Decimal::ZERO), 100);
        assert_eq!(display_score(Decimal::ONE), 1000);
        assert_eq!(display_score(dec!(3)), 2800);
    }

    #[test]
    fn test_serialized_output_uses_dashboard_field_names() {
        let outcome = analyzer().rank(&[AgentNavs::new("solo", vec![dec!(1000), dec!(1010)])]);
        let value = serde_json::to_value(&outcome.ranked[0]).unwrap();
        for field in ["agentId", "roi", "sortino", "calmar", "stability", "srs", "rank"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }
}
