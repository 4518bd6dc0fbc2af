use analytics::AnalyticsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Agent '{agent_id}' has an invalid NAV history: {source}")]
    InvalidHistory {
        agent_id: String,
        source: AnalyticsError,
    },
}
