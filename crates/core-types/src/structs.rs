use crate::enums::AgentStatus;
use crate::error::CoreError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// One valuation sample for an agent, as handed over by a valuation source.
///
/// Observations are transient: the ledger turns them into a `NavPoint` and
/// only the point is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub agent_id: String,
    /// The agent's net worth, in the same unit across time.
    pub valuation: Decimal,
    pub observed_at: NaiveDateTime,
    /// Raw profit/loss context reported by the venue. Not used in NAV math.
    pub pnl: Option<Decimal>,
}

impl Observation {
    pub fn new(agent_id: impl Into<String>, valuation: Decimal, observed_at: NaiveDateTime) -> Self {
        Self {
            agent_id: agent_id.into(),
            valuation,
            observed_at,
            pnl: None,
        }
    }

    pub fn with_pnl(mut self, pnl: Option<Decimal>) -> Self {
        self.pnl = pnl;
        self
    }

    /// The calendar date this observation is booked under.
    pub fn date(&self) -> NaiveDate {
        self.observed_at.date()
    }
}

/// Converts a floating point valuation into a `Decimal`, rejecting NaN and infinities.
pub fn valuation_from_f64(value: f64) -> Result<Decimal, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::InvalidInput(
            "valuation".to_string(),
            format!("{} is not a finite number", value),
        ));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        CoreError::InvalidInput(
            "valuation".to_string(),
            format!("{} is out of the representable range", value),
        )
    })
}

/// A single persisted point of an agent's NAV history.
///
/// Field names on the wire follow the dashboard's `liveData` format: the NAV
/// is stored as `value` and the valuation that produced it as `collateral`
/// (older files written by vault trackers call it `tvl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "capture_timestamp"
    )]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "value", with = "rust_decimal::serde::float")]
    pub nav: Decimal,
    #[serde(
        rename = "collateral",
        alias = "tvl",
        default,
        with = "rust_decimal::serde::float"
    )]
    pub valuation: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub pnl: Option<Decimal>,
    /// Percentage distance below the running peak NAV, always `<= 0`.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub drawdown: Decimal,
}

impl NavPoint {
    pub fn new(observed_at: NaiveDateTime, nav: Decimal, valuation: Decimal) -> Self {
        let date = observed_at.date();
        Self {
            date,
            timestamp: Some(observed_at),
            year: Some(date.year()),
            nav,
            valuation,
            pnl: None,
            drawdown: Decimal::ZERO,
        }
    }
}

/// The ordered NAV history of one agent, oldest point first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentHistory {
    points: Vec<NavPoint>,
}

impl AgentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<NavPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [NavPoint] {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<NavPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    pub fn push(&mut self, point: NavPoint) {
        self.points.push(point);
    }

    pub fn pop(&mut self) -> Option<NavPoint> {
        self.points.pop()
    }

    /// The NAV column in chronological order.
    pub fn navs(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.nav).collect()
    }

    /// Index of the first point whose date is not strictly after its predecessor's.
    pub fn first_order_violation(&self) -> Option<usize> {
        self.points
            .windows(2)
            .position(|w| w[1].date <= w[0].date)
            .map(|i| i + 1)
    }

    /// Returns the first date that appears more than once, if any.
    pub fn duplicate_date(&self) -> Option<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        dates.sort_unstable();
        dates.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
    }

    /// Restores date order. Drawdowns depend on order, so they are recomputed.
    pub fn sort_by_date(&mut self) {
        self.points.sort_by_key(|p| p.date);
        recompute_drawdowns(&mut self.points);
    }
}

/// Recomputes the drawdown of every point against the running peak NAV.
///
/// `drawdown_i = (nav_i - peak_i) / peak_i * 100`, where `peak_i` is the
/// highest NAV in `points[..=i]`.
pub fn recompute_drawdowns(points: &mut [NavPoint]) {
    let mut peak: Option<Decimal> = None;

    for point in points.iter_mut() {
        let running_peak = peak.map_or(point.nav, |p| p.max(point.nav));
        peak = Some(running_peak);

        point.drawdown = if running_peak > Decimal::ZERO {
            (point.nav - running_peak) / running_peak * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
}

/// Everything persisted for one agent: its history plus the latest venue state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    #[serde(default)]
    pub live_data: AgentHistory,
    /// The last valuation seen for this agent.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub tvl: Decimal,
    #[serde(default)]
    pub status: AgentStatus,
}

impl AgentRecord {
    pub fn new(live_data: AgentHistory, tvl: Decimal, status: AgentStatus) -> Self {
        Self {
            live_data,
            tvl,
            status,
        }
    }
}

/// Capture timestamps are written as `YYYY-MM-DD HH:MM:SS`; ISO-8601 is accepted on read.
mod capture_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            NaiveDateTime::parse_from_str(&s, FORMAT)
                .or_else(|_| s.parse::<NaiveDateTime>())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
