use async_trait::async_trait;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::BrowserConfig;
use crate::session::{BrowserProcess, NodeHandle, Session, SettleCondition};
use crate::utils::error::AppError;
use crate::Result;

const CLIENT_WIDTH_FN: &str = "function() { return this.clientWidth; }";

/// A locally launched Chrome/Chromium process.
pub struct ChromeBrowser {
    browser: Mutex<Option<Browser>>,
    config: BrowserConfig,
}

impl ChromeBrowser {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-extensions"),
        ];
        if !config.sandbox {
            // Often needed in containerized environments
            args.push(OsStr::new("--no-sandbox"));
        }
        args.extend(config.extra_args.iter().map(OsStr::new));

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .window_size(Some((config.window_width, config.window_height)))
            .args(args)
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        tracing::debug!(
            headless = config.headless,
            width = config.window_width,
            height = config.window_height,
            "Creating browser instance"
        );
        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl BrowserProcess for ChromeBrowser {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let tab = {
            let guard = self
                .browser
                .lock()
                .map_err(|_| AppError::Internal("browser lock poisoned".into()))?;
            let browser = guard
                .as_ref()
                .ok_or_else(|| AppError::Browser("Browser has already been closed".into()))?;

            // An incognito context per session keeps cookies and storage apart.
            browser
                .new_context()
                .and_then(|context| context.new_tab())
                .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?
        };

        tab.set_default_timeout(Duration::from_secs(self.config.navigation_timeout_secs));
        if let Some(user_agent) = &self.config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Box::new(ChromeSession::new(tab, &self.config)))
    }

    async fn close(&self) -> Result<()> {
        let browser = self
            .browser
            .lock()
            .map_err(|_| AppError::Internal("browser lock poisoned".into()))?
            .take();

        // Dropping the handle terminates the Chrome process.
        if browser.is_some() {
            tracing::debug!("Terminating browser process");
        }
        drop(browser);
        Ok(())
    }
}

pub struct ChromeSession {
    id: String,
    tab: Arc<Tab>,
    settle_delay: Duration,
    navigation_timeout_secs: u64,
    closed: Mutex<bool>,
}

impl ChromeSession {
    fn new(tab: Arc<Tab>, config: &BrowserConfig) -> Self {
        Self {
            id: tab.get_target_id().to_string(),
            tab,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            navigation_timeout_secs: config.navigation_timeout_secs,
            closed: Mutex::new(false),
        }
    }

    fn resolve_all(&self, selector: &str) -> Result<Vec<NodeHandle>> {
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => return Ok(Vec::new()),
            Err(e) => return Err(AppError::probe(selector, e)),
        };

        elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let text = element
                    .get_inner_text()
                    .map_err(|e| AppError::probe(selector, e))?;
                let width = element
                    .call_js_fn(CLIENT_WIDTH_FN, vec![], false)
                    .ok()
                    .and_then(|object| object.value)
                    .and_then(|value| value.as_f64());
                Ok(NodeHandle::new(selector, index, text).with_client_width(width))
            })
            .collect()
    }
}

/// `wait_until_navigated` gives up with `util::Timeout` once the tab's
/// default timeout passes.
fn navigation_error(err: anyhow::Error, url: &str, timeout_secs: u64) -> AppError {
    if err.downcast_ref::<Timeout>().is_some() {
        AppError::Timeout {
            operation: format!("navigate to {}", url),
            seconds: timeout_secs,
        }
    } else {
        AppError::Navigation {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Session for ChromeSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, settle: SettleCondition) -> Result<()> {
        tracing::debug!(session = %self.id, "Navigating to page: {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| navigation_error(e, url, self.navigation_timeout_secs))?;
        self.wait_for_settle(settle).await
    }

    async fn wait_for_settle(&self, settle: SettleCondition) -> Result<()> {
        // CDP has no network-idle event; a quiet period after load stands in.
        let delay = match settle {
            SettleCondition::NetworkAlmostIdle => self.settle_delay,
            SettleCondition::NetworkIdle => self.settle_delay * 2,
        };
        tokio::time::sleep(delay).await;
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<NodeHandle>> {
        Ok(self.resolve_all(selector)?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeHandle>> {
        self.resolve_all(selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.tab
            .find_element(selector)
            .and_then(|element| element.click().map(|_| ()))
            .map_err(|e| AppError::probe(selector, e))
    }

    async fn title(&self) -> Result<String> {
        self.tab
            .get_title()
            .map_err(|e| AppError::Browser(format!("Failed to read page title: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        {
            let mut closed = self
                .closed
                .lock()
                .map_err(|_| AppError::Internal("session lock poisoned".into()))?;
            if *closed {
                return Ok(());
            }
            *closed = true;
        }

        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| AppError::Browser(format!("Failed to close tab {}: {}", self.id, e)))
    }
}
