use crate::error::StorageError;
use chrono::NaiveDate;
use core_types::AgentRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One point of the trimmed equity curve the dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub drawdown: Decimal,
}

/// The `HistoryRepository` provides a high-level interface to the per-agent
/// history files. It encapsulates all paths and file-format details.
///
/// Each agent lives in `live-data-<id>.json` as `{ "<id>": { liveData, tvl, status } }`.
/// Writes for the same agent are last-writer-wins across processes.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    data_dir: PathBuf,
}

impl HistoryRepository {
    /// Creates a new `HistoryRepository` rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn live_data_path(&self, agent_id: &str) -> PathBuf {
        self.data_dir.join(format!("live-data-{}.json", agent_id))
    }

    pub fn equity_curve_path(&self, agent_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("equity-historical-{}.json", agent_id))
    }

    /// Loads an agent's record. Returns `Ok(None)` if the agent has no history file yet.
    ///
    /// A history that is merely out of order is re-sorted; one with duplicated
    /// dates is reported as `CorruptHistory`.
    pub async fn load(&self, agent_id: &str) -> Result<Option<AgentRecord>, StorageError> {
        let path = self.live_data_path(agent_id);

        // Snapshot read: the whole file is in memory before anything is parsed.
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path)(e)),
        };

        let mut file: BTreeMap<String, AgentRecord> =
            serde_json::from_str(&contents).map_err(|e| StorageError::CorruptHistory {
                agent_id: agent_id.to_string(),
                reason: e.to_string(),
            })?;

        let mut record = file
            .remove(agent_id)
            .ok_or_else(|| StorageError::CorruptHistory {
                agent_id: agent_id.to_string(),
                reason: format!("{} has no entry for this agent", path.display()),
            })?;

        repair_order(agent_id, &mut record)?;
        Ok(Some(record))
    }

    /// Loads just the NAV column of an agent's history, for ranking.
    pub async fn load_nav_snapshot(&self, agent_id: &str) -> Result<Vec<Decimal>, StorageError> {
        self.load(agent_id)
            .await?
            .map(|record| record.live_data.navs())
            .ok_or_else(|| StorageError::MissingAgentData(agent_id.to_string()))
    }

    /// Persists an agent's record, replacing the previous file only once the new one is complete.
    pub async fn save(&self, agent_id: &str, record: &AgentRecord) -> Result<(), StorageError> {
        let mut file = BTreeMap::new();
        file.insert(agent_id.to_string(), record);

        let contents = serde_json::to_vec_pretty(&file)?;
        self.write_atomic(&self.live_data_path(agent_id), &contents)
            .await?;

        tracing::debug!(agent = %agent_id, points = record.live_data.len(), "History saved.");
        Ok(())
    }

    /// Writes the trimmed `{date, year, value, drawdown}` curve derived from a record.
    pub async fn export_equity_curve(
        &self,
        agent_id: &str,
        record: &AgentRecord,
    ) -> Result<PathBuf, StorageError> {
        let curve: Vec<EquityPoint> = record
            .live_data
            .points()
            .iter()
            .map(|p| EquityPoint {
                date: p.date,
                year: p.year,
                value: p.nav,
                drawdown: p.drawdown,
            })
            .collect();

        let path = self.equity_curve_path(agent_id);
        let contents = serde_json::to_vec_pretty(&curve)?;
        self.write_atomic(&path, &contents).await?;
        Ok(path)
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(StorageError::io(&self.data_dir))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(StorageError::io(&tmp))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(StorageError::io(path))?;
        Ok(())
    }
}

fn repair_order(agent_id: &str, record: &mut AgentRecord) -> Result<(), StorageError> {
    let Some(index) = record.live_data.first_order_violation() else {
        return Ok(());
    };

    if let Some(date) = record.live_data.duplicate_date() {
        return Err(StorageError::CorruptHistory {
            agent_id: agent_id.to_string(),
            reason: format!("date {} appears more than once", date),
        });
    }

    tracing::warn!(agent = %agent_id, index, "History is not date-ordered. Re-sorting.");
    // Also recomputes every drawdown against the restored order.
    record.live_data.sort_by_date();
    Ok(())
}
