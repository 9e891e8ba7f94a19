use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;

use crate::models::{Edition, RetailerDescriptor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub browser: BrowserConfig,
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
    /// Extra or overriding retailer descriptors.
    #[serde(default)]
    pub retailers: Vec<RetailerDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub navigation_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub default_retailers: Vec<String>,
    #[serde(default)]
    pub edition: Edition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            chrome_path: None,
            window_width: 1280,
            window_height: 1280,
            navigation_timeout_secs: 30,
            settle_delay_ms: 500,
            user_agent: None,
            extra_args: vec!["--start-maximized".to_string()],
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_retailers: vec![
                "bolnl".to_string(),
                "coolbluenl".to_string(),
                "mediamarktnl".to_string(),
            ],
            edition: Edition::Disc,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: level_for_run_mode(env::var("RUN_MODE").ok().as_deref()).to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            runner: RunnerConfig::default(),
            logging: LoggingConfig::default(),
            retailers: Vec::new(),
        }
    }
}

/// `production` logs at info, `development` at debug, anything else at info.
pub fn level_for_run_mode(run_mode: Option<&str>) -> &'static str {
    match run_mode {
        Some("development") => "debug",
        _ => "info",
    }
}

impl AppConfig {
    /// Layers: built-in defaults, `config/default`, `config/{RUN_MODE}`,
    /// `config/local`, an explicit file, then `STOCKWATCH__*` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Config::try_from(&AppConfig::default())?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(Environment::with_prefix("STOCKWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::Message("Browser window size must be greater than 0".into()));
        }

        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Browser navigation_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid logging level '{}'",
                self.logging.level
            )));
        }

        let mut keys = HashSet::new();
        for retailer in &self.retailers {
            retailer.validate()?;
            if !keys.insert(retailer.key.trim().to_lowercase()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate retailer key '{}' in configuration",
                    retailer.key
                )));
            }
        }

        Ok(())
    }
}
