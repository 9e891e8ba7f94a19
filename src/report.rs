//! Reporting sink for check events and verdicts.
//!
//! The runner and every check receive the sink explicitly; nothing here is
//! process-global.

use serde::Serialize;
use std::sync::Mutex;
use tracing::Level;
use uuid::Uuid;

use crate::models::{Availability, CheckState, JobRecord, ValidatorOutcome};
use crate::Result;

pub trait ReportSink: Send + Sync {
    fn event(&self, level: Level, retailer: &str, message: &str);

    fn job_finished(&self, record: &JobRecord);

    fn debug(&self, retailer: &str, message: &str) {
        self.event(Level::DEBUG, retailer, message);
    }

    fn info(&self, retailer: &str, message: &str) {
        self.event(Level::INFO, retailer, message);
    }

    fn warn(&self, retailer: &str, message: &str) {
        self.event(Level::WARN, retailer, message);
    }

    fn error(&self, retailer: &str, message: &str) {
        self.event(Level::ERROR, retailer, message);
    }
}

/// Forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn event(&self, level: Level, retailer: &str, message: &str) {
        match level {
            Level::ERROR => tracing::error!(retailer, "{}", message),
            Level::WARN => tracing::warn!(retailer, "{}", message),
            Level::INFO => tracing::info!(retailer, "{}", message),
            Level::DEBUG => tracing::debug!(retailer, "{}", message),
            _ => tracing::trace!(retailer, "{}", message),
        }
    }

    fn job_finished(&self, record: &JobRecord) {
        match record {
            JobRecord::Completed(job) => tracing::info!(
                retailer = job.retailer_key(),
                job = %job.id(),
                result = %job.final_result(),
                "Job finished"
            ),
            JobRecord::Failed { job, error } => tracing::error!(
                retailer = job.retailer_key(),
                job = %job.id(),
                state = %job.state(),
                "Job failed: {}",
                error
            ),
            JobRecord::LookupFailed { key, error } => {
                tracing::error!(retailer = key.as_str(), "{}", error)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEvent {
    pub level: Level,
    pub retailer: String,
    pub message: String,
}

/// Keeps every event and verdict in memory, for callers that aggregate
/// results themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ReportEvent>>,
    verdicts: Mutex<Vec<(String, Availability)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, retailer: &str) -> Vec<ReportEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.retailer == retailer)
            .collect()
    }

    pub fn verdicts(&self) -> Vec<(String, Availability)> {
        self.verdicts.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn event(&self, level: Level, retailer: &str, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ReportEvent {
                level,
                retailer: retailer.to_string(),
                message: message.to_string(),
            });
        }
    }

    fn job_finished(&self, record: &JobRecord) {
        if let Ok(mut verdicts) = self.verdicts.lock() {
            verdicts.push((record.key().to_string(), record.availability()));
        }
    }
}

/// Plain-text summary of a batch, one block per retailer.
pub fn render_summary(records: &[JobRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("{:<14} {}\n", record.key(), record.availability()));
        if let Some(job) = record.job() {
            let outcomes = job.structural_outcome().into_iter().chain(job.evaluation_outcomes());
            for outcome in outcomes {
                out.push_str(&format!("    {}\n", outcome));
            }
            if let Some(reason) = job.reason() {
                out.push_str(&format!("    reason: {}\n", reason));
            }
        }
        if let Some(error) = record.error() {
            out.push_str(&format!("    error: {}\n", error));
        }
    }
    out
}

/// Serializable view of one batch slot.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport<'a> {
    pub retailer: &'a str,
    pub job_id: Option<Uuid>,
    pub state: Option<CheckState>,
    pub availability: Availability,
    pub structural: Option<&'a ValidatorOutcome>,
    pub evaluation: &'a [ValidatorOutcome],
    pub reason: Option<&'a str>,
    pub error: Option<String>,
}

impl<'a> From<&'a JobRecord> for JobReport<'a> {
    fn from(record: &'a JobRecord) -> Self {
        let job = record.job();
        Self {
            retailer: record.key(),
            job_id: job.map(|j| j.id()),
            state: job.map(|j| j.state()),
            availability: record.availability(),
            structural: job.and_then(|j| j.structural_outcome()),
            evaluation: job.map(|j| j.evaluation_outcomes()).unwrap_or_default(),
            reason: job.and_then(|j| j.reason()),
            error: record.error().map(|e| e.to_string()),
        }
    }
}

pub fn render_json(records: &[JobRecord]) -> Result<String> {
    let reports: Vec<JobReport<'_>> = records.iter().map(JobReport::from).collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckJob;
    use crate::utils::error::AppError;

    #[test]
    fn test_memory_sink_collects_events() {
        let sink = MemorySink::new();
        sink.info("bolnl", "Checking availability");
        sink.debug("coolbluenl", "Navigating");
        sink.error("bolnl", "HTML form failed validation.");

        assert_eq!(sink.events().len(), 3);
        let bol = sink.events_for("bolnl");
        assert_eq!(bol.len(), 2);
        assert_eq!(bol[1].level, Level::ERROR);
    }

    #[test]
    fn test_memory_sink_records_verdicts() {
        let sink = MemorySink::new();
        sink.job_finished(&JobRecord::LookupFailed {
            key: "amazonnl".to_string(),
            error: AppError::RegistryLookup {
                key: "amazonnl".to_string(),
            },
        });
        assert_eq!(
            sink.verdicts(),
            vec![("amazonnl".to_string(), Availability::Indeterminate)]
        );
    }

    #[test]
    fn test_render_summary() {
        let records = vec![
            JobRecord::Completed(CheckJob::new("mediamarktnl")),
            JobRecord::LookupFailed {
                key: "amazonnl".to_string(),
                error: AppError::RegistryLookup {
                    key: "amazonnl".to_string(),
                },
            },
        ];
        let summary = render_summary(&records);
        assert!(summary.contains("mediamarktnl"));
        assert!(summary.contains("indeterminate"));
        assert!(summary.contains("error: Retailer could not be found for value: 'amazonnl'"));
    }

    #[test]
    fn test_render_summary_lists_evidence_in_order() {
        use crate::models::{TriState, Validator};

        let mut job = CheckJob::new("bolnl");
        job.set_structural_outcome(
            Validator::new("Article header contains 'Sony PlayStation 5 Console'").record(TriState::True),
        );
        job.set_evaluation_outcomes(vec![
            Validator::new("Article purchase button exists").record(TriState::Unknown),
        ]);
        job.finish(Availability::Indeterminate, Some("availability evidence was inconclusive".into()));

        let summary = render_summary(&[JobRecord::Completed(job)]);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(
            lines,
            vec![
                "bolnl          indeterminate",
                "    ✓ Article header contains 'Sony PlayStation 5 Console'",
                "    ? Article purchase button exists",
                "    reason: availability evidence was inconclusive",
            ]
        );
    }

    #[test]
    fn test_render_json() {
        let records = vec![JobRecord::LookupFailed {
            key: "amazonnl".to_string(),
            error: AppError::RegistryLookup {
                key: "amazonnl".to_string(),
            },
        }];
        let json: serde_json::Value = serde_json::from_str(&render_json(&records).unwrap()).unwrap();
        assert_eq!(json[0]["retailer"], "amazonnl");
        assert_eq!(json[0]["availability"], "indeterminate");
        assert!(json[0]["job_id"].is_null());
        assert_eq!(json[0]["evaluation"].as_array().map(Vec::len), Some(0));
    }
}
