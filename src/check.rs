//! The per-retailer check sequence.
//!
//! `Created → Navigated → ConsentResolved → StructurallyValidated → Evaluated`
//! and then one of `Available`, `Unavailable` or `Indeterminate`. Every
//! retailer runs the same engine; only the `RetailerDescriptor` differs.

use std::sync::Arc;
use std::time::Duration;

use crate::combinator;
use crate::models::{
    Availability, CheckJob, CheckState, JobRecord, PurchaseAction, RetailerDescriptor, TriState,
    Validator, ValidatorOutcome,
};
use crate::probe::DomProbe;
use crate::report::ReportSink;
use crate::session::{NodeHandle, Session, SettleCondition};
use crate::utils::error::AppError;
use crate::Result;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// One retailer check bound to one session. The session is used by this
/// check alone for as long as the check exists.
pub struct RetailerCheck<'a> {
    descriptor: Arc<RetailerDescriptor>,
    session: &'a dyn Session,
    sink: &'a dyn ReportSink,
    job: CheckJob,
    navigation_timeout: Duration,
}

impl<'a> RetailerCheck<'a> {
    pub fn new(
        descriptor: Arc<RetailerDescriptor>,
        session: &'a dyn Session,
        sink: &'a dyn ReportSink,
    ) -> Self {
        let job = CheckJob::new(descriptor.key.clone());
        Self {
            descriptor,
            session,
            sink,
            job,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn state(&self) -> CheckState {
        self.job.state()
    }

    pub fn job(&self) -> &CheckJob {
        &self.job
    }

    /// Drives the check to a terminal state. Navigation failures end the
    /// check with an `Indeterminate` job and the error attached.
    pub async fn run(mut self) -> JobRecord {
        match self.drive().await {
            Ok(()) => JobRecord::Completed(self.job),
            Err(error) => {
                self.sink.error(&self.descriptor.key, &error.to_string());
                self.job
                    .finish(Availability::Indeterminate, Some(error.to_string()));
                JobRecord::Failed {
                    job: self.job,
                    error,
                }
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        self.sink.info(
            &self.descriptor.key,
            &format!("Checking availability at '{}'", self.descriptor.display_name),
        );

        self.navigate().await?;
        self.resolve_consent().await;

        self.sink.debug(&self.descriptor.key, "Performing validation tests");
        if !self.validate_structure().await {
            return Ok(());
        }

        self.sink.debug(&self.descriptor.key, "Performing order availability tests");
        self.evaluate().await;
        Ok(())
    }

    async fn goto(&self, settle: SettleCondition) -> Result<()> {
        let url = &self.descriptor.target_url;
        self.sink.debug(&self.descriptor.key, &format!("Navigating to page: {}", url));
        tokio::time::timeout(self.navigation_timeout, self.session.navigate(url, settle))
            .await
            .map_err(|_| AppError::Timeout {
                operation: format!("navigate to {}", url),
                seconds: self.navigation_timeout.as_secs(),
            })?
    }

    async fn navigate(&mut self) -> Result<()> {
        self.goto(SettleCondition::NetworkAlmostIdle).await?;
        self.job.advance(CheckState::Navigated);
        Ok(())
    }

    /// Best effort: every failure is reported and swallowed.
    async fn resolve_consent(&mut self) {
        if let Some(selector) = self.descriptor.consent_prompt_selector.clone() {
            match self.accept_consent(&selector).await {
                Ok(true) => self.sink.debug(&self.descriptor.key, "Consented to cookie policy"),
                Ok(false) => self.sink.debug(&self.descriptor.key, "No consent prompt shown"),
                Err(e) => self.sink.debug(&self.descriptor.key, &e.to_string()),
            }
        }
        self.job.advance(CheckState::ConsentResolved);
    }

    async fn accept_consent(&self, selector: &str) -> Result<bool> {
        let prompt = self
            .session
            .query_selector(selector)
            .await
            .map_err(|e| AppError::ConsentHandling(e.to_string()))?;
        if prompt.is_none() {
            return Ok(false);
        }

        self.sink.debug(&self.descriptor.key, "Detected prompt to consent to cookies");
        self.session
            .click(selector)
            .await
            .map_err(|e| AppError::ConsentHandling(e.to_string()))?;
        self.session
            .wait_for_settle(SettleCondition::NetworkIdle)
            .await
            .map_err(|e| AppError::ConsentHandling(e.to_string()))?;

        // Reload to reach the post-consent DOM.
        self.goto(SettleCondition::NetworkIdle)
            .await
            .map_err(|e| AppError::ConsentHandling(e.to_string()))?;
        Ok(true)
    }

    /// Fail-fast identity guard. Returns whether evaluation may proceed.
    async fn validate_structure(&mut self) -> bool {
        let expected = &self.descriptor.expected_structural_text;
        let validator = Validator::new(format!("Article header contains '{}'", expected));
        let result = DomProbe::new(self.session)
            .text_contains(self.descriptor.structural_selector.as_str(), expected)
            .await;
        let outcome = validator.record(result);
        self.sink.debug(&self.descriptor.key, &outcome.log_line());
        self.job.set_structural_outcome(outcome);

        if result.is_true() {
            self.sink.debug(&self.descriptor.key, "HTML page passed validation");
            self.job.advance(CheckState::StructurallyValidated);
            return true;
        }

        let reason = match result {
            TriState::False => format!("page header does not contain '{}'", expected),
            _ => "page header could not be read".to_string(),
        };
        self.sink.error(
            &self.descriptor.key,
            &format!("HTML page failed validation: {}", reason),
        );
        self.job.finish(Availability::Indeterminate, Some(reason));
        false
    }

    /// Runs all three availability probes, then combines them.
    async fn evaluate(&mut self) {
        let outcomes = self.gather_evidence().await;
        for outcome in &outcomes {
            self.sink.debug(&self.descriptor.key, &outcome.log_line());
        }
        self.job.set_evaluation_outcomes(outcomes);
        self.job.advance(CheckState::Evaluated);

        let verdict = Availability::from(combinator::combine(self.job.evaluation_outcomes()));
        let name = &self.descriptor.display_name;
        let reason = match verdict {
            Availability::Available => {
                self.sink.info(&self.descriptor.key, &format!("Product is available at '{}'", name));
                None
            }
            Availability::Unavailable => {
                self.sink.info(&self.descriptor.key, &format!("Product is not available at '{}'", name));
                None
            }
            Availability::Indeterminate => {
                self.sink.warn(
                    &self.descriptor.key,
                    &format!("Availability at '{}' could not be determined", name),
                );
                Some("availability evidence was inconclusive".to_string())
            }
        };
        self.job.finish(verdict, reason);
    }

    async fn gather_evidence(&self) -> Vec<ValidatorOutcome> {
        let descriptor = &self.descriptor;
        let probe = DomProbe::new(self.session);

        let sold_out_text = &descriptor.expected_out_of_stock_text;
        let not_sold_out = Validator::new(format!(
            "Out-of-stock notice does not contain '{}'",
            sold_out_text
        ));
        let notice = probe
            .text_contains(descriptor.availability.out_of_stock_notice.as_str(), sold_out_text)
            .await;
        let not_sold_out = not_sold_out.record(!notice);

        let label = &descriptor.expected_purchase_action_text;
        let button_exists = Validator::new("Article purchase button exists");
        let button_labeled = Validator::new(format!("Purchase button contains '{}'", label));

        let (exists, labeled) = match &descriptor.availability.purchase_action {
            PurchaseAction::Selector { selector } => (
                probe.exists(selector.as_str()).await,
                probe.text_contains(selector.as_str(), label).await,
            ),
            PurchaseAction::WidthMatched { selector, client_width } => {
                self.sink.debug(&descriptor.key, "Checking whether purchase button is rendered");
                match probe.resolve_by_width(selector, *client_width).await {
                    Ok(node) => {
                        let node: Option<&NodeHandle> = node.as_ref();
                        (probe.exists(node).await, probe.text_contains(node, label).await)
                    }
                    Err(e) => {
                        self.sink.debug(&descriptor.key, &e.to_string());
                        (TriState::Unknown, TriState::Unknown)
                    }
                }
            }
        };

        vec![
            not_sold_out,
            button_exists.record(exists),
            button_labeled.record(labeled),
        ]
    }
}
