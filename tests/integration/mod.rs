// Integration tests for stockwatch
// These tests drive full batches against saved product pages

pub mod check_tests;
pub mod runner_tests;

use std::sync::Arc;
pub use stockwatch::{
    models::{Availability, CheckState, Edition, JobRecord, TriState},
    report::MemorySink,
    retailers::{self, RetailerRegistry},
    session::{BrowserProcess, SnapshotBrowser},
    AppError, JobRunner,
};

pub const BOL_URL: &str = "https://www.bol.com/nl/p/sony-playstation-5-console/9300000004162282/";
pub const COOLBLUE_URL: &str = "https://www.coolblue.nl/product/865866/playstation-5.html";
pub const MEDIAMARKT_URL: &str =
    "https://www.mediamarkt.nl/nl/product/_sony-playstation-5-disk-edition-1664768.html";

/// What a fixture product page shows.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub header: &'a str,
    pub notice: &'a str,
    pub button: Option<&'a str>,
}

pub const BOL_IN_STOCK: Listing<'static> = Listing {
    header: "Sony PlayStation 5 Console",
    notice: "",
    button: Some("In winkelwagen"),
};

pub const COOLBLUE_IN_STOCK: Listing<'static> = Listing {
    header: "PlayStation 5",
    notice: "Morgen in huis",
    button: Some("In mijn winkelwagen"),
};

pub const MEDIAMARKT_IN_STOCK: Listing<'static> = Listing {
    header: "SONY PlayStation 5 Disk Edition",
    notice: "",
    button: Some("BESTEL NU"),
};

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>PlayStation 5 kopen</title></head><body>{}</body></html>",
        body
    )
}

/// Bol renders a decoy buy button next to the real, 147px wide one.
pub fn bol_page(listing: Listing<'_>) -> String {
    let button = listing
        .button
        .map(|label| {
            format!(
                r#"<a class="js_preventable_buy_action" data-client-width="60">Op verlanglijstje</a>
                   <a class="js_preventable_buy_action" data-client-width="147">{}</a>"#,
                label
            )
        })
        .unwrap_or_default();
    document(&format!(
        r#"<div id="mainContent"><div>
             <div class="constrain constrain--main h-bottom--m">
               <div class="pdp-header slot slot--pdp-header js_slot-title">
                 <h1>
                   <span class="h-boxedright--xs">{}</span>
                   <span class="sub-title">{}</span>
                 </h1>
               </div>
             </div>
             <div class="buy-block">{}</div>
           </div></div>"#,
        listing.header, listing.notice, button
    ))
}

pub fn coolblue_page(listing: Listing<'_>) -> String {
    let button = listing
        .button
        .map(|label| format!("<button>{}</button>", label))
        .unwrap_or_default();
    document(&format!(
        r#"<div id="main-content">
             <h1><span>{}</span></h1>
             <div class="grid-section-xs--gap-4 grid-section-m--gap-5"><div>
               <div class="grid-unit-xs--col-12 grid-unit-m--col-6 grid-unit-xl--col-5 js-sticky-bar-trigger"><div>
                 <div><div><div>
                   <div class="icon-with-text__text"><div>{}</div></div>
                 </div></div></div>
                 <div class="grid-section-xs--gap-4 grid-section-m--gap-5 js-order-block">
                   <div class="js-desktop-order-block"><div>
                     <div class="grid-section-xs--gap-4 is-hidden-until-size-m"><form>
                       <div class="grid-section-xs--gap-4 is-hidden-until-size-m">{}</div>
                     </form></div>
                   </div></div>
                 </div>
               </div></div>
             </div></div>
           </div>"#,
        listing.header, listing.notice, button
    ))
}

pub fn mediamarkt_page(listing: Listing<'_>) -> String {
    let button = listing
        .button
        .map(|label| format!(r#"<button id="pdp-add-to-cart">{}</button>"#, label))
        .unwrap_or_default();
    document(&format!(
        r#"<div id="product-sidebar"><h1>{}</h1>{}</div>
           <div id="product-details">
             <div class="price-sidebar product-pricing has-monthly-price">
               <div class="price-details">
                 <div class="box infobox availability"><ul>
                   <li class="false online-nostock"><span>{}</span></li>
                 </ul></div>
               </div>
             </div>
           </div>"#,
        listing.header, button, listing.notice
    ))
}

/// The cookie modal Bol and Coolblue both show before consent.
pub fn with_cookie_modal(page: &str) -> String {
    let modal = r#"<div class="cookie"><div>
        <div class="modal-box__container js-modal-box__container">
          <div class="modal-box__content position--relative js-modal-box__content"><div><div>
            <div class="grid-unit-xs--col-12 grid-unit-m--col-7"><form><div>
              <div class="grid-unit-xs--col-12 grid-unit-m--col-12 space--bottom-4">
                <button>Accepteren</button>
              </div>
            </div></form></div>
          </div></div></div>
        </div>
      </div></div>"#;
    page.replacen("<body>", &format!("<body>{}", modal), 1)
}

/// All three built-in retailers with the product in stock.
pub fn in_stock_browser() -> SnapshotBrowser {
    SnapshotBrowser::new()
        .with_page(BOL_URL, bol_page(BOL_IN_STOCK))
        .with_page(COOLBLUE_URL, coolblue_page(COOLBLUE_IN_STOCK))
        .with_page(MEDIAMARKT_URL, mediamarkt_page(MEDIAMARKT_IN_STOCK))
}

pub fn create_test_runner() -> (JobRunner, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(RetailerRegistry::builtin(), sink.clone());
    (runner, sink)
}

pub fn results(record: &JobRecord) -> Vec<TriState> {
    record
        .job()
        .map(|job| job.evaluation_outcomes().iter().map(|o| o.result).collect())
        .unwrap_or_default()
}
