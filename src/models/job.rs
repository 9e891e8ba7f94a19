use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Availability, ValidatorOutcome};
use crate::utils::error::AppError;

/// Lifecycle of one retailer check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Created,
    Navigated,
    ConsentResolved,
    StructurallyValidated,
    Evaluated,
    Available,
    Unavailable,
    Indeterminate,
}

impl CheckState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckState::Available | CheckState::Unavailable | CheckState::Indeterminate
        )
    }
}

impl From<Availability> for CheckState {
    fn from(value: Availability) -> Self {
        match value {
            Availability::Available => CheckState::Available,
            Availability::Unavailable => CheckState::Unavailable,
            Availability::Indeterminate => CheckState::Indeterminate,
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckState::Created => "created",
            CheckState::Navigated => "navigated",
            CheckState::ConsentResolved => "consent_resolved",
            CheckState::StructurallyValidated => "structurally_validated",
            CheckState::Evaluated => "evaluated",
            CheckState::Available => "available",
            CheckState::Unavailable => "unavailable",
            CheckState::Indeterminate => "indeterminate",
        };
        write!(f, "{}", name)
    }
}

/// Evidence and verdict of one retailer check. Owned by exactly one
/// `RetailerCheck`; frozen once the check reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckJob {
    id: Uuid,
    retailer_key: String,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    state: CheckState,
    structural_outcome: Option<ValidatorOutcome>,
    evaluation_outcomes: Vec<ValidatorOutcome>,
    final_result: Availability,
    reason: Option<String>,
}

impl CheckJob {
    pub fn new(retailer_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            retailer_key: retailer_key.into(),
            created_at: Utc::now(),
            finished_at: None,
            state: CheckState::Created,
            structural_outcome: None,
            evaluation_outcomes: Vec::new(),
            final_result: Availability::Indeterminate,
            reason: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn retailer_key(&self) -> &str {
        &self.retailer_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn structural_outcome(&self) -> Option<&ValidatorOutcome> {
        self.structural_outcome.as_ref()
    }

    pub fn evaluation_outcomes(&self) -> &[ValidatorOutcome] {
        &self.evaluation_outcomes
    }

    pub fn final_result(&self) -> Availability {
        self.final_result
    }

    /// Why the check ended `Indeterminate`, if it did.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub(crate) fn advance(&mut self, state: CheckState) {
        if self.is_finished() {
            tracing::warn!(job = %self.id, "Ignoring transition to {} on finished job", state);
            return;
        }
        self.state = state;
    }

    pub(crate) fn set_structural_outcome(&mut self, outcome: ValidatorOutcome) {
        if !self.is_finished() {
            self.structural_outcome = Some(outcome);
        }
    }

    pub(crate) fn set_evaluation_outcomes(&mut self, outcomes: Vec<ValidatorOutcome>) {
        if !self.is_finished() {
            self.evaluation_outcomes = outcomes;
        }
    }

    pub(crate) fn finish(&mut self, result: Availability, reason: Option<String>) {
        if self.is_finished() {
            return;
        }
        self.final_result = result;
        self.reason = reason;
        self.state = CheckState::from(result);
        self.finished_at = Some(Utc::now());
    }
}

/// One slot of a batch run, in input order.
#[derive(Debug)]
pub enum JobRecord {
    /// The check reached a terminal state.
    Completed(CheckJob),
    /// The check stopped on a job-scoped error; the job carries whatever
    /// evidence was gathered and an `Indeterminate` verdict.
    Failed { job: CheckJob, error: AppError },
    /// The key did not resolve against the registry; no session was opened.
    LookupFailed { key: String, error: AppError },
}

impl JobRecord {
    pub fn key(&self) -> &str {
        match self {
            JobRecord::Completed(job) => job.retailer_key(),
            JobRecord::Failed { job, .. } => job.retailer_key(),
            JobRecord::LookupFailed { key, .. } => key,
        }
    }

    pub fn job(&self) -> Option<&CheckJob> {
        match self {
            JobRecord::Completed(job) | JobRecord::Failed { job, .. } => Some(job),
            JobRecord::LookupFailed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            JobRecord::Completed(_) => None,
            JobRecord::Failed { error, .. } | JobRecord::LookupFailed { error, .. } => Some(error),
        }
    }

    pub fn availability(&self) -> Availability {
        self.job()
            .map(CheckJob::final_result)
            .unwrap_or(Availability::Indeterminate)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobRecord::Completed(_))
    }
}
