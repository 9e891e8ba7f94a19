use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::TriState;

/// A named check whose result is assigned exactly once.
///
/// `Validator::new` starts the result at `Unknown`; `record` consumes the
/// validator so a second assignment cannot happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    description: String,
}

impl Validator {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn record(self, result: TriState) -> ValidatorOutcome {
        ValidatorOutcome {
            description: self.description,
            result,
        }
    }

    /// Outcome for a validator that was never evaluated.
    pub fn unset(self) -> ValidatorOutcome {
        self.record(TriState::Unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorOutcome {
    pub description: String,
    pub result: TriState,
}

impl ValidatorOutcome {
    pub fn glyph(&self) -> &'static str {
        match self.result {
            TriState::True => "✓",
            TriState::False => "x",
            TriState::Unknown => "?",
        }
    }

    /// Log line for observability only.
    pub fn log_line(&self) -> String {
        format!("{} {}", self.glyph(), self.description)
    }
}

impl fmt::Display for ValidatorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.description)
    }
}
