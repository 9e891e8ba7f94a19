//! Contracts for the browser collaborator.
//!
//! A `BrowserProcess` owns every `Session` it opens. Each session is an
//! isolated page context used by exactly one retailer check and must be
//! closed before that check is discarded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub mod chrome;
pub mod snapshot;

pub use chrome::{ChromeBrowser, ChromeSession};
pub use snapshot::{SnapshotBrowser, SnapshotSession, SnapshotStats};

/// What "the page has settled" means after a navigation or click.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettleCondition {
    /// At most a couple of requests still in flight.
    NetworkAlmostIdle,
    /// No requests in flight.
    NetworkIdle,
}

/// A DOM node resolved by a query. Carries the rendered text captured at
/// resolution time so probes against it never re-query the page.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHandle {
    selector: String,
    index: usize,
    text: String,
    client_width: Option<f64>,
}

impl NodeHandle {
    pub fn new(selector: impl Into<String>, index: usize, text: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            index,
            text: text.into(),
            client_width: None,
        }
    }

    pub fn with_client_width(mut self, width: Option<f64>) -> Self {
        self.client_width = width;
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Position among all nodes matching `selector`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn client_width(&self) -> Option<f64> {
        self.client_width
    }
}

/// One isolated, browser-controlled page context.
#[async_trait]
pub trait Session: Send + Sync {
    fn id(&self) -> &str;

    async fn navigate(&self, url: &str, settle: SettleCondition) -> Result<()>;
    async fn wait_for_settle(&self, settle: SettleCondition) -> Result<()>;

    /// `Ok(None)` when nothing matches; errors are reserved for failed queries.
    async fn query_selector(&self, selector: &str) -> Result<Option<NodeHandle>>;
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeHandle>>;

    async fn click(&self, selector: &str) -> Result<()>;
    async fn title(&self) -> Result<String>;

    /// Idempotent.
    async fn close(&self) -> Result<()>;
}

/// The browser process that owns all sessions.
#[async_trait]
pub trait BrowserProcess: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn Session>>;

    /// Terminates the process. Callers close every session first.
    async fn close(&self) -> Result<()>;
}
