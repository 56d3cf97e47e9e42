use thiserror::Error;

use super::types::Money;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Input rejected before any simulation step runs.
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    /// Every parameter was individually valid, but no initial consumption
    /// inside the widened search bracket reaches the bequest target.
    #[error("bequest target {target} is unreachable within the consumption search bracket")]
    InfeasibleTarget { target: Money },

    /// Utility is undefined for non-positive consumption. Reaching this
    /// indicates a solver configuration defect, not a user input error.
    #[error("consumption is not positive at period {period}, utility is undefined")]
    NonPositiveConsumption { period: u32 },
}

impl EngineError {
    pub fn invalid(field: &str, reason: &str) -> Self {
        EngineError::InvalidParameter {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
