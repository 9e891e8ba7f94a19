//! Offline session backend serving saved HTML pages.
//!
//! Pages are keyed by URL. A page may carry a post-consent variant that is
//! served on the next navigation once anything has been clicked. Static
//! markup has no layout, so `clientWidth` is read from a `data-client-width`
//! or `width` attribute.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::retailers::RetailerRegistry;
use crate::session::{BrowserProcess, NodeHandle, Session, SettleCondition};
use crate::utils::error::AppError;
use crate::Result;

#[derive(Debug, Clone)]
struct SnapshotPage {
    html: String,
    after_consent: Option<String>,
}

/// Counters shared by a snapshot browser and all of its sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotStats {
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub browser_closed: bool,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub queries: Vec<String>,
}

impl SnapshotStats {
    pub fn open_sessions(&self) -> usize {
        self.sessions_opened - self.sessions_closed
    }
}

#[derive(Clone, Default)]
pub struct SnapshotBrowser {
    pages: Arc<HashMap<String, SnapshotPage>>,
    stats: Arc<Mutex<SnapshotStats>>,
    closed: Arc<Mutex<bool>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("snapshot lock poisoned".into()))
}

impl SnapshotBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url.into(), html.into(), None)
    }

    pub fn with_consent_page(
        self,
        url: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        self.insert(url.into(), before.into(), Some(after.into()))
    }

    fn insert(self, url: String, html: String, after_consent: Option<String>) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(url, SnapshotPage { html, after_consent });
        Self {
            pages: Arc::new(pages),
            ..self
        }
    }

    /// Loads `<key>.html` (and `<key>.consented.html` when present) for every
    /// registered retailer, served under that retailer's target URL.
    pub fn from_dir(dir: &Path, registry: &RetailerRegistry) -> Result<Self> {
        let mut browser = Self::new();
        for descriptor in registry.descriptors() {
            let page = dir.join(format!("{}.html", descriptor.key));
            if !page.exists() {
                tracing::debug!("No snapshot for retailer '{}' in {}", descriptor.key, dir.display());
                continue;
            }
            let html = std::fs::read_to_string(&page)?;
            let consented = dir.join(format!("{}.consented.html", descriptor.key));
            browser = if consented.exists() {
                let after = std::fs::read_to_string(&consented)?;
                browser.with_consent_page(descriptor.target_url.clone(), html, after)
            } else {
                browser.with_page(descriptor.target_url.clone(), html)
            };
        }
        Ok(browser)
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BrowserProcess for SnapshotBrowser {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        if *lock(&self.closed)? {
            return Err(AppError::Browser("Browser has already been closed".into()));
        }
        let id = {
            let mut stats = lock(&self.stats)?;
            stats.sessions_opened += 1;
            format!("snapshot-{}", stats.sessions_opened)
        };
        Ok(Box::new(SnapshotSession {
            id,
            pages: Arc::clone(&self.pages),
            stats: Arc::clone(&self.stats),
            state: Mutex::new(SessionState::default()),
        }))
    }

    async fn close(&self) -> Result<()> {
        *lock(&self.closed)? = true;
        lock(&self.stats)?.browser_closed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    html: Option<String>,
    consented: bool,
    closed: bool,
}

pub struct SnapshotSession {
    id: String,
    pages: Arc<HashMap<String, SnapshotPage>>,
    stats: Arc<Mutex<SnapshotStats>>,
    state: Mutex<SessionState>,
}

impl SnapshotSession {
    fn current_html(&self) -> Result<String> {
        let state = lock(&self.state)?;
        if state.closed {
            return Err(AppError::Browser(format!("Session {} is closed", self.id)));
        }
        state
            .html
            .clone()
            .ok_or_else(|| AppError::Browser(format!("Session {} has no page loaded", self.id)))
    }

    fn select(&self, selector: &str) -> Result<Vec<NodeHandle>> {
        lock(&self.stats)?.queries.push(selector.to_string());
        let html = self.current_html()?;
        parse_nodes(&html, selector)
    }
}

fn parse_nodes(html: &str, selector: &str) -> Result<Vec<NodeHandle>> {
    let css = Selector::parse(selector)
        .map_err(|e| AppError::probe(selector, format!("invalid CSS selector: {:?}", e)))?;
    let document = Html::parse_document(html);

    let nodes = document
        .select(&css)
        .enumerate()
        .map(|(index, element)| {
            let text = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let width = element
                .value()
                .attr("data-client-width")
                .or_else(|| element.value().attr("width"))
                .and_then(|w| w.trim().parse::<f64>().ok());
            NodeHandle::new(selector, index, text).with_client_width(width)
        })
        .collect();
    Ok(nodes)
}

#[async_trait]
impl Session for SnapshotSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, _settle: SettleCondition) -> Result<()> {
        lock(&self.stats)?.navigations.push(url.to_string());
        let mut state = lock(&self.state)?;
        if state.closed {
            return Err(AppError::Browser(format!("Session {} is closed", self.id)));
        }

        let page = self.pages.get(url).ok_or_else(|| AppError::Navigation {
            url: url.to_string(),
            message: "no snapshot recorded for this URL".to_string(),
        })?;

        let html = match (&page.after_consent, state.consented) {
            (Some(after), true) => after.clone(),
            _ => page.html.clone(),
        };
        state.html = Some(html);
        Ok(())
    }

    async fn wait_for_settle(&self, _settle: SettleCondition) -> Result<()> {
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<NodeHandle>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeHandle>> {
        self.select(selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if self.select(selector)?.is_empty() {
            return Err(AppError::probe(selector, "no node to click"));
        }
        lock(&self.stats)?.clicks.push(selector.to_string());
        lock(&self.state)?.consented = true;
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let html = self.current_html()?;
        Ok(parse_nodes(&html, "title")?
            .into_iter()
            .next()
            .map(|node| node.text().to_string())
            .unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.html = None;
        lock(&self.stats)?.sessions_closed += 1;
        Ok(())
    }
}
