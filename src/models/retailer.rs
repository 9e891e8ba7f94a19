use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[default]
    Disc,
    Digital,
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disc" | "disk" | "disc_edition" | "disk_edition" => Ok(Edition::Disc),
            "digital" | "digital_edition" => Ok(Edition::Digital),
            other => Err(format!("Unknown edition '{}', expected 'disc' or 'digital'", other)),
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Disc => write!(f, "disc"),
            Edition::Digital => write!(f, "digital"),
        }
    }
}

/// How the purchase button is located on the product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PurchaseAction {
    /// The first node matching `selector`.
    Selector { selector: String },
    /// Several nodes share `selector`; the real one is the only candidate
    /// rendered with this `clientWidth`.
    WidthMatched { selector: String, client_width: f64 },
}

impl PurchaseAction {
    pub fn selector(&self) -> &str {
        match self {
            PurchaseAction::Selector { selector } => selector,
            PurchaseAction::WidthMatched { selector, .. } => selector,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilitySelectors {
    pub out_of_stock_notice: String,
    pub purchase_action: PurchaseAction,
}

/// Static, read-only description of one retailer's product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetailerDescriptor {
    pub key: String,
    pub display_name: String,
    pub locale: String,
    #[serde(default)]
    pub edition: Edition,
    pub target_url: String,
    #[serde(default)]
    pub consent_prompt_selector: Option<String>,
    pub structural_selector: String,
    pub availability: AvailabilitySelectors,
    pub expected_structural_text: String,
    pub expected_out_of_stock_text: String,
    pub expected_purchase_action_text: String,
}

impl RetailerDescriptor {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::Message("Retailer key must not be empty".into()));
        }

        if Url::parse(&self.target_url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid target URL for retailer '{}': {}",
                self.key, self.target_url
            )));
        }

        let selectors = [
            ("structural_selector", self.structural_selector.as_str()),
            ("out_of_stock_notice", self.availability.out_of_stock_notice.as_str()),
            ("purchase_action", self.availability.purchase_action.selector()),
        ];
        for (name, selector) in selectors {
            if selector.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Retailer '{}' has an empty {} selector",
                    self.key, name
                )));
            }
        }

        if matches!(&self.consent_prompt_selector, Some(s) if s.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "Retailer '{}' has an empty consent_prompt_selector",
                self.key
            )));
        }

        if self.expected_structural_text.is_empty()
            || self.expected_out_of_stock_text.is_empty()
            || self.expected_purchase_action_text.is_empty()
        {
            return Err(ConfigError::Message(format!(
                "Retailer '{}' must define all expected text fragments",
                self.key
            )));
        }

        Ok(())
    }
}
