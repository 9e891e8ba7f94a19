//! Batch execution over a list of retailer keys.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::check::{RetailerCheck, DEFAULT_NAVIGATION_TIMEOUT};
use crate::models::{Availability, CheckJob, JobRecord};
use crate::report::ReportSink;
use crate::retailers::RetailerRegistry;
use crate::session::{BrowserProcess, Session};
use crate::utils::error::AppError;

/// Label used for events that belong to the batch rather than a retailer.
pub const BATCH: &str = "batch";

pub struct JobRunner {
    registry: RetailerRegistry,
    sink: Arc<dyn ReportSink>,
    navigation_timeout: Duration,
}

impl JobRunner {
    pub fn new(registry: RetailerRegistry, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            registry,
            sink,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &RetailerRegistry {
        &self.registry
    }

    /// Runs one check per key, in order, one session at a time.
    ///
    /// Returns one record per key in input order. A failing slot never
    /// aborts the batch. Every opened session is closed after its check and
    /// the browser is closed before returning, whatever happened.
    pub async fn run_all<S: AsRef<str>>(
        &self,
        browser: &dyn BrowserProcess,
        keys: &[S],
    ) -> Vec<JobRecord> {
        self.sink.info(
            BATCH,
            &format!("Creating job queue for {} retailer(s)", keys.len()),
        );

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let record = self.run_slot(browser, key.as_ref()).await;
            self.sink.job_finished(&record);
            records.push(record);
        }

        self.sink.debug(BATCH, "Closing browser");
        if let Err(e) = browser.close().await {
            self.sink.warn(BATCH, &format!("Error closing browser: {}", e));
        }

        let available = records
            .iter()
            .filter(|r| r.availability() == Availability::Available)
            .count();
        self.sink.info(
            BATCH,
            &format!("Finished {} job(s), {} available", records.len(), available),
        );
        records
    }

    async fn run_slot(&self, browser: &dyn BrowserProcess, key: &str) -> JobRecord {
        let descriptor = match self.registry.resolve(key) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                self.sink.error(key, &error.to_string());
                return JobRecord::LookupFailed {
                    key: key.to_string(),
                    error,
                };
            }
        };

        let session = match browser.open_session().await {
            Ok(session) => session,
            Err(error) => {
                self.sink.error(&descriptor.key, &format!("Could not open browser page: {}", error));
                return failed(&descriptor.key, error);
            }
        };

        let check = RetailerCheck::new(Arc::clone(&descriptor), session.as_ref(), self.sink.as_ref())
            .with_navigation_timeout(self.navigation_timeout);
        let outcome = AssertUnwindSafe(check.run()).catch_unwind().await;

        self.release(&descriptor.key, session.as_ref()).await;

        outcome.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            self.sink.error(
                &descriptor.key,
                &format!("An unexpected error occurred: {}", message),
            );
            failed(
                &descriptor.key,
                AppError::Internal(format!("check aborted: {}", message)),
            )
        })
    }

    /// Close errors are reported, never propagated.
    async fn release(&self, key: &str, session: &dyn Session) {
        match session.title().await {
            Ok(title) => self.sink.debug(key, &format!("Closing browser page: {}", title)),
            Err(_) => self
                .sink
                .debug(key, &format!("Closing browser page: {}", session.id())),
        }
        if let Err(e) = session.close().await {
            self.sink.warn(key, &format!("Error closing browser page: {}", e));
        }
    }
}

fn failed(key: &str, error: AppError) -> JobRecord {
    let mut job = CheckJob::new(key);
    job.finish(Availability::Indeterminate, Some(error.to_string()));
    JobRecord::Failed { job, error }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
