use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("NAV {value} at index {index} cannot be used as a return base")]
    InvalidHistory { index: usize, value: Decimal },

    #[error("Calculation error in metric '{0}'")]
    Calculation(String),
}
