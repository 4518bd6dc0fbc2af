use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("Invalid observation for agent '{agent_id}': {reason}")]
    InvalidObservation { agent_id: String, reason: String },

    #[error("History of agent '{agent_id}' is not date-ordered at index {index} ({date})")]
    UnsortedHistory {
        agent_id: String,
        index: usize,
        date: NaiveDate,
    },

    #[error(
        "Valuation {valuation} for agent '{agent_id}' is outside the plausible range [{min}, {max}]"
    )]
    ImplausibleValuation {
        agent_id: String,
        valuation: Decimal,
        min: String,
        max: String,
    },
}
