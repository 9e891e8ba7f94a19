use crate::models::TriState;
use crate::session::{NodeHandle, Session};
use crate::Result;

/// Tolerance when matching a rendered `clientWidth`.
const WIDTH_EPSILON: f64 = 0.5;

/// What a probe runs against: a selector to query, a node that has already
/// been resolved, or nothing at all.
#[derive(Debug, Clone, Copy)]
pub enum ProbeTarget<'a> {
    Selector(&'a str),
    Node(&'a NodeHandle),
    Absent,
}

impl<'a> From<&'a str> for ProbeTarget<'a> {
    fn from(selector: &'a str) -> Self {
        ProbeTarget::Selector(selector)
    }
}

impl<'a> From<&'a NodeHandle> for ProbeTarget<'a> {
    fn from(node: &'a NodeHandle) -> Self {
        ProbeTarget::Node(node)
    }
}

impl<'a> From<Option<&'a NodeHandle>> for ProbeTarget<'a> {
    fn from(node: Option<&'a NodeHandle>) -> Self {
        node.map(ProbeTarget::Node).unwrap_or(ProbeTarget::Absent)
    }
}

impl<'a> From<Option<&'a str>> for ProbeTarget<'a> {
    fn from(selector: Option<&'a str>) -> Self {
        selector.map(ProbeTarget::Selector).unwrap_or(ProbeTarget::Absent)
    }
}

/// DOM queries against one session. Probes never fail: query errors
/// degrade to `TriState::Unknown`.
pub struct DomProbe<'s> {
    session: &'s dyn Session,
}

impl<'s> DomProbe<'s> {
    pub fn new(session: &'s dyn Session) -> Self {
        Self { session }
    }

    /// `True` iff a node resolves. An absent handle is `False`.
    pub async fn exists<'t>(&self, target: impl Into<ProbeTarget<'t>>) -> TriState {
        match target.into() {
            ProbeTarget::Absent => TriState::False,
            ProbeTarget::Node(_) => TriState::True,
            ProbeTarget::Selector(selector) => match self.session.query_selector(selector).await {
                Ok(node) => TriState::from(node.is_some()),
                Err(e) => {
                    tracing::debug!(session = self.session.id(), "Existence probe failed: {}", e);
                    TriState::Unknown
                }
            },
        }
    }

    /// Case-sensitive substring test on the node's rendered text.
    ///
    /// An absent target is `Unknown`; a selector that matches nothing is
    /// `False`, since there is no text that could contain `needle`.
    pub async fn text_contains<'t>(&self, target: impl Into<ProbeTarget<'t>>, needle: &str) -> TriState {
        match target.into() {
            ProbeTarget::Absent => TriState::Unknown,
            ProbeTarget::Node(node) => TriState::from(node.text().contains(needle)),
            ProbeTarget::Selector(selector) => match self.session.query_selector(selector).await {
                Ok(Some(node)) => TriState::from(node.text().contains(needle)),
                Ok(None) => TriState::False,
                Err(e) => {
                    tracing::debug!(session = self.session.id(), "Text probe failed: {}", e);
                    TriState::Unknown
                }
            },
        }
    }

    pub async fn resolve(&self, selector: &str) -> Result<Option<NodeHandle>> {
        self.session.query_selector(selector).await
    }

    /// The single candidate under `selector` rendered `width` pixels wide.
    /// Zero or several matches resolve to `None`.
    pub async fn resolve_by_width(&self, selector: &str, width: f64) -> Result<Option<NodeHandle>> {
        let candidates = self.session.query_selector_all(selector).await?;
        let mut matching: Vec<NodeHandle> = candidates
            .into_iter()
            .filter(|node| {
                node.client_width()
                    .is_some_and(|w| (w - width).abs() < WIDTH_EPSILON)
            })
            .collect();

        match matching.len() {
            1 => {
                tracing::debug!("Successfully located 1 matching node for '{}'", selector);
                Ok(matching.pop())
            }
            0 => {
                tracing::debug!("No nodes under '{}' are {}px wide", selector, width);
                Ok(None)
            }
            n => {
                tracing::debug!("{} nodes under '{}' are {}px wide; refusing to pick one", n, selector, width);
                Ok(None)
            }
        }
    }
}
