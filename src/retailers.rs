//! Fixed registry of retailer descriptors.
//!
//! Adding a retailer is a data change: either a new entry in `builtin()` or a
//! `[[retailers]]` table in the configuration file.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{AvailabilitySelectors, Edition, PurchaseAction, RetailerDescriptor};
use crate::utils::error::AppError;
use crate::Result;

const MODAL_COOKIE_BUTTON: &str = "body > div.cookie > div > div.modal-box__container.js-modal-box__container > div.modal-box__content.position--relative.js-modal-box__content > div > div > div.grid-unit-xs--col-12.grid-unit-m--col-7 > form > div > div.grid-unit-xs--col-12.grid-unit-m--col-12.space--bottom-4 > button";

pub fn bol_nl() -> RetailerDescriptor {
    RetailerDescriptor {
        key: "bolnl".to_string(),
        display_name: "Bol".to_string(),
        locale: "nl-NL".to_string(),
        edition: Edition::Disc,
        target_url: "https://www.bol.com/nl/p/sony-playstation-5-console/9300000004162282/".to_string(),
        consent_prompt_selector: Some(MODAL_COOKIE_BUTTON.to_string()),
        structural_selector: "#mainContent > div > div.constrain.constrain--main.h-bottom--m > div.pdp-header.slot.slot--pdp-header.js_slot-title > h1 > span.h-boxedright--xs".to_string(),
        availability: AvailabilitySelectors {
            out_of_stock_notice: "#mainContent > div > div.constrain.constrain--main.h-bottom--m > div.pdp-header.slot.slot--pdp-header.js_slot-title > h1 > span.sub-title".to_string(),
            // Bol renders several buy buttons; the visible one is 147px wide.
            purchase_action: PurchaseAction::WidthMatched {
                selector: ".js_preventable_buy_action".to_string(),
                client_width: 147.0,
            },
        },
        expected_structural_text: "Sony PlayStation 5 Console".to_string(),
        expected_out_of_stock_text: "UITVERKOCHT".to_string(),
        expected_purchase_action_text: "In winkelwagen".to_string(),
    }
}

pub fn coolblue_nl() -> RetailerDescriptor {
    RetailerDescriptor {
        key: "coolbluenl".to_string(),
        display_name: "Coolblue".to_string(),
        locale: "nl-NL".to_string(),
        edition: Edition::Disc,
        target_url: "https://www.coolblue.nl/product/865866/playstation-5.html".to_string(),
        consent_prompt_selector: Some(MODAL_COOKIE_BUTTON.to_string()),
        structural_selector: "#main-content > h1 > span".to_string(),
        availability: AvailabilitySelectors {
            out_of_stock_notice: "#main-content > div.grid-section-xs--gap-4.grid-section-m--gap-5 > div > div.grid-unit-xs--col-12.grid-unit-m--col-6.grid-unit-xl--col-5.js-sticky-bar-trigger > div > div:nth-child(1) > div > div > div.icon-with-text__text > div".to_string(),
            purchase_action: PurchaseAction::Selector {
                selector: "#main-content > div.grid-section-xs--gap-4.grid-section-m--gap-5 > div > div.grid-unit-xs--col-12.grid-unit-m--col-6.grid-unit-xl--col-5.js-sticky-bar-trigger > div > div.grid-section-xs--gap-4.grid-section-m--gap-5.js-order-block > div.js-desktop-order-block > div > div.grid-section-xs--gap-4.is-hidden-until-size-m > form > div.grid-section-xs--gap-4.is-hidden-until-size-m > button".to_string(),
            },
        },
        expected_structural_text: "PlayStation 5".to_string(),
        expected_out_of_stock_text: "Door een beperkte voorraad".to_string(),
        expected_purchase_action_text: "In mijn winkelwagen".to_string(),
    }
}

pub fn mediamarkt_nl() -> RetailerDescriptor {
    RetailerDescriptor {
        key: "mediamarktnl".to_string(),
        display_name: "Mediamarkt".to_string(),
        locale: "nl-NL".to_string(),
        edition: Edition::Disc,
        target_url: "https://www.mediamarkt.nl/nl/product/_sony-playstation-5-disk-edition-1664768.html".to_string(),
        consent_prompt_selector: Some("body > div.gdpr-cookie-layer.gdpr-cookie-layer--show > div > div.gdpr-cookie-layer__lower-section > div.gdpr-cookie-layer__submit-buttons > button.gdpr-cookie-layer__btn.gdpr-cookie-layer__btn--submit.gdpr-cookie-layer__btn--submit--all".to_string()),
        structural_selector: "#product-sidebar > h1".to_string(),
        availability: AvailabilitySelectors {
            out_of_stock_notice: "#product-details > div.price-sidebar.product-pricing.has-monthly-price > div.price-details > div.box.infobox.availability > ul > li.false.online-nostock > span".to_string(),
            purchase_action: PurchaseAction::Selector {
                selector: "#pdp-add-to-cart".to_string(),
            },
        },
        expected_structural_text: "SONY PlayStation 5 Disk Edition".to_string(),
        expected_out_of_stock_text: "Online uitverkocht".to_string(),
        expected_purchase_action_text: "BESTEL NU".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetailerRegistry {
    retailers: BTreeMap<String, Arc<RetailerDescriptor>>,
}

impl RetailerRegistry {
    pub fn builtin() -> Self {
        Self::from_descriptors([bol_nl(), coolblue_nl(), mediamarkt_nl()])
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = RetailerDescriptor>) -> Self {
        let retailers = descriptors
            .into_iter()
            .map(|d| (normalize_key(&d.key), Arc::new(d)))
            .collect();
        Self { retailers }
    }

    /// Adds configured descriptors, replacing built-ins with the same key.
    pub fn with_overrides(mut self, extra: &[RetailerDescriptor]) -> Self {
        for descriptor in extra {
            let key = normalize_key(&descriptor.key);
            if self.retailers.contains_key(&key) {
                tracing::debug!("Overriding built-in retailer '{}' from configuration", key);
            }
            self.retailers.insert(key, Arc::new(descriptor.clone()));
        }
        self
    }

    /// Only the retailers listing the given edition.
    pub fn for_edition(&self, edition: Edition) -> Self {
        let retailers = self
            .retailers
            .iter()
            .filter(|(_, d)| d.edition == edition)
            .map(|(k, d)| (k.clone(), Arc::clone(d)))
            .collect();
        Self { retailers }
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<RetailerDescriptor>> {
        self.retailers
            .get(&normalize_key(key))
            .cloned()
            .ok_or_else(|| AppError::RegistryLookup {
                key: key.to_string(),
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.retailers.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &RetailerDescriptor> {
        self.retailers.values().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.retailers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retailers.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
