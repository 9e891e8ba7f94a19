use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// Three-valued probe result. `Unknown` means the probe could not be
/// evaluated and is never the same thing as `False`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    True,
    False,
    #[default]
    Unknown,
}

impl TriState {
    pub fn is_true(self) -> bool {
        self == TriState::True
    }

    pub fn is_false(self) -> bool {
        self == TriState::False
    }

    pub fn is_unknown(self) -> bool {
        self == TriState::Unknown
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map(TriState::from).unwrap_or(TriState::Unknown)
    }
}

// Unknown stays unknown under negation.
impl Not for TriState {
    type Output = TriState;

    fn not(self) -> Self::Output {
        match self {
            TriState::True => TriState::False,
            TriState::False => TriState::True,
            TriState::Unknown => TriState::Unknown,
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::True => write!(f, "true"),
            TriState::False => write!(f, "false"),
            TriState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Final verdict of one retailer check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    #[default]
    Indeterminate,
}

impl From<TriState> for Availability {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Availability::Available,
            TriState::False => Availability::Unavailable,
            TriState::Unknown => Availability::Indeterminate,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::Indeterminate => write!(f, "indeterminate"),
        }
    }
}
