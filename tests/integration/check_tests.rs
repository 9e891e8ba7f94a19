use super::*;
use stockwatch::RetailerCheck;

async fn check(browser: &SnapshotBrowser, descriptor: stockwatch::models::RetailerDescriptor) -> JobRecord {
    let sink = MemorySink::new();
    let session = browser.open_session().await.expect("session");
    let record = RetailerCheck::new(Arc::new(descriptor), session.as_ref(), &sink)
        .run()
        .await;
    session.close().await.expect("close");
    record
}

#[tokio::test]
async fn test_bol_picks_visible_buy_button() {
    let browser = SnapshotBrowser::new().with_page(BOL_URL, bol_page(BOL_IN_STOCK));

    let record = check(&browser, retailers::bol_nl()).await;

    let job = record.job().expect("job");
    assert_eq!(job.state(), CheckState::Available);
    let descriptions: Vec<&str> = job
        .evaluation_outcomes()
        .iter()
        .map(|o| o.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "Out-of-stock notice does not contain 'UITVERKOCHT'",
            "Article purchase button exists",
            "Purchase button contains 'In winkelwagen'",
        ]
    );
}

#[tokio::test]
async fn test_bol_sold_out() {
    let browser = SnapshotBrowser::new().with_page(
        BOL_URL,
        bol_page(Listing {
            notice: "Tijdelijk UITVERKOCHT",
            button: None,
            ..BOL_IN_STOCK
        }),
    );

    let record = check(&browser, retailers::bol_nl()).await;

    assert_eq!(record.availability(), Availability::Unavailable);
    assert_eq!(
        results(&record),
        vec![TriState::False, TriState::False, TriState::Unknown]
    );
}

#[tokio::test]
async fn test_coolblue_limited_stock_notice() {
    let browser = SnapshotBrowser::new().with_page(
        COOLBLUE_URL,
        coolblue_page(Listing {
            notice: "Door een beperkte voorraad is dit product tijdelijk niet leverbaar",
            button: Some("Houd mij op de hoogte"),
            ..COOLBLUE_IN_STOCK
        }),
    );

    let record = check(&browser, retailers::coolblue_nl()).await;

    assert_eq!(record.availability(), Availability::Unavailable);
    assert_eq!(
        results(&record),
        vec![TriState::False, TriState::True, TriState::False]
    );
}

#[tokio::test]
async fn test_structural_outcome_is_recorded() {
    let browser = SnapshotBrowser::new().with_page(MEDIAMARKT_URL, mediamarkt_page(MEDIAMARKT_IN_STOCK));

    let record = check(&browser, retailers::mediamarkt_nl()).await;

    let outcome = record.job().and_then(|j| j.structural_outcome()).expect("structural outcome");
    assert_eq!(
        outcome.to_string(),
        "✓ Article header contains 'SONY PlayStation 5 Disk Edition'"
    );
    assert!(record.job().is_some_and(|j| j.finished_at().is_some()));
}
