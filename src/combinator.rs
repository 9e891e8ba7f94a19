//! Reduction of validator evidence into one verdict.

use crate::models::{TriState, ValidatorOutcome};
use crate::utils::error::AppError;
use crate::Result;

/// `False` if any outcome is `False`, `True` if all are `True`, otherwise
/// `Unknown`. Order does not matter. An empty sequence is not valid evidence.
pub fn try_combine(outcomes: &[ValidatorOutcome]) -> Result<TriState> {
    if outcomes.is_empty() {
        return Err(AppError::CombinationInput(
            "no validator outcomes to combine".to_string(),
        ));
    }

    if outcomes.iter().any(|o| o.result.is_false()) {
        return Ok(TriState::False);
    }
    if outcomes.iter().all(|o| o.result.is_true()) {
        return Ok(TriState::True);
    }
    Ok(TriState::Unknown)
}

/// Like [`try_combine`], with malformed input collapsing to `Unknown`.
pub fn combine(outcomes: &[ValidatorOutcome]) -> TriState {
    try_combine(outcomes).unwrap_or_else(|e| {
        tracing::error!("Error occurred when combining validator results: {}", e);
        TriState::Unknown
    })
}
