use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Consent handling failed: {0}")]
    ConsentHandling(String),

    #[error("Probe failed for '{selector}': {message}")]
    Probe { selector: String, message: String },

    #[error("Retailer could not be found for value: '{key}'")]
    RegistryLookup { key: String },

    #[error("Invalid validator evidence: {0}")]
    CombinationInput(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors that end the current retailer slot but never the batch.
    pub fn is_job_scoped(&self) -> bool {
        matches!(
            self,
            AppError::Navigation { .. }
                | AppError::Timeout { .. }
                | AppError::RegistryLookup { .. }
                | AppError::Browser(_)
        )
    }

    pub fn probe(selector: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::Probe {
            selector: selector.into(),
            message: err.to_string(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
