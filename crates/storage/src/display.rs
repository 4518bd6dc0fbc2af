use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the dashboard's strategy list, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub color: String,
    pub srs: i64,
    pub rank: usize,
}

/// Writes the ranked display list, replacing any previous file only after the new one is complete.
pub async fn write_display_config(path: &Path, entries: &[DisplayEntry]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StorageError::io(parent))?;
    }

    let contents = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(StorageError::io(&tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(StorageError::io(path))?;

    tracing::info!(path = %path.display(), agents = entries.len(), "Display configuration written.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_entries_in_given_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("strategies-config.json");
        let entries = vec![
            DisplayEntry {
                id: "systemic_hyper".to_string(),
                name: "Systemic Hyper".to_string(),
                protocol: "Hyperliquid".to_string(),
                color: "#35c58a".to_string(),
                srs: 912,
                rank: 1,
            },
            DisplayEntry {
                id: "sentquant".to_string(),
                name: "Sentquant".to_string(),
                protocol: "Lighter".to_string(),
                color: "#f3f4f5".to_string(),
                srs: 100,
                rank: 2,
            },
        ];

        write_display_config(&path, &entries).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "systemic_hyper");
        assert_eq!(value[0]["srs"], 912);
        assert_eq!(value[1]["rank"], 2);

        let parsed: Vec<DisplayEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, entries);
    }
}
