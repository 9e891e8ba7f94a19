use super::*;

#[tokio::test]
async fn test_all_retailers_available() -> anyhow::Result<()> {
    let browser = in_stock_browser();
    let (runner, sink) = create_test_runner();

    let records = runner
        .run_all(&browser, &["bolnl", "coolbluenl", "mediamarktnl"])
        .await;

    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(record.is_completed(), "{} should complete", record.key());
        assert_eq!(record.availability(), Availability::Available);
        assert_eq!(results(record), vec![TriState::True; 3]);
    }

    let stats = browser.stats();
    assert_eq!(stats.sessions_opened, 3);
    assert_eq!(stats.sessions_closed, 3);
    assert!(stats.browser_closed);
    assert_eq!(sink.verdicts().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_sold_out_retailer_records_single_false() -> anyhow::Result<()> {
    let browser = in_stock_browser().with_page(
        MEDIAMARKT_URL,
        mediamarkt_page(Listing {
            notice: "Online uitverkocht",
            ..MEDIAMARKT_IN_STOCK
        }),
    );
    let (runner, _sink) = create_test_runner();

    let records = runner.run_all(&browser, &["mediamarktnl"]).await;

    assert_eq!(records[0].availability(), Availability::Unavailable);
    let results = results(&records[0]);
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.is_false()).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_key_does_not_abort_batch() -> anyhow::Result<()> {
    let browser = in_stock_browser();
    let (runner, sink) = create_test_runner();

    let records = runner
        .run_all(&browser, &["coolbluenl", "amazonnl", "mediamarktnl"])
        .await;

    let keys: Vec<&str> = records.iter().map(JobRecord::key).collect();
    assert_eq!(keys, vec!["coolbluenl", "amazonnl", "mediamarktnl"]);
    assert_eq!(records.iter().filter(|r| r.is_completed()).count(), 2);
    assert!(matches!(
        &records[1],
        JobRecord::LookupFailed { error: AppError::RegistryLookup { key }, .. } if key == "amazonnl"
    ));

    let stats = browser.stats();
    assert_eq!(stats.sessions_opened, 2);
    assert_eq!(stats.sessions_closed, 2);
    assert!(stats.browser_closed);

    assert!(sink
        .events_for("amazonnl")
        .iter()
        .any(|e| e.message == "Retailer could not be found for value: 'amazonnl'"));
    Ok(())
}

#[tokio::test]
async fn test_navigation_failure_is_job_scoped() -> anyhow::Result<()> {
    // No snapshot for Bol: its navigation fails.
    let browser = SnapshotBrowser::new()
        .with_page(COOLBLUE_URL, coolblue_page(COOLBLUE_IN_STOCK));
    let (runner, _sink) = create_test_runner();

    let records = runner.run_all(&browser, &["bolnl", "coolbluenl"]).await;

    match &records[0] {
        JobRecord::Failed { job, error } => {
            assert!(error.is_job_scoped());
            assert_eq!(job.state(), CheckState::Indeterminate);
            assert!(job.evaluation_outcomes().is_empty());
        }
        other => panic!("expected a failed record, got {:?}", other),
    }
    assert_eq!(records[1].availability(), Availability::Available);

    let stats = browser.stats();
    assert_eq!(stats.open_sessions(), 0);
    assert!(stats.browser_closed);
    Ok(())
}

#[tokio::test]
async fn test_identity_mismatch_runs_no_evaluation_probes() -> anyhow::Result<()> {
    let browser = SnapshotBrowser::new().with_page(
        BOL_URL,
        bol_page(Listing {
            header: "Microsoft Xbox Series X",
            ..BOL_IN_STOCK
        }),
    );
    let (runner, _sink) = create_test_runner();

    let records = runner.run_all(&browser, &["bolnl"]).await;

    let job = records[0].job().expect("job");
    assert!(records[0].is_completed());
    assert_eq!(job.final_result(), Availability::Indeterminate);
    assert!(job.evaluation_outcomes().is_empty());
    assert_eq!(
        job.structural_outcome().map(|o| o.result),
        Some(TriState::False)
    );
    assert!(!browser
        .stats()
        .queries
        .iter()
        .any(|q| q == ".js_preventable_buy_action"));
    Ok(())
}

#[tokio::test]
async fn test_consent_modal_is_accepted() -> anyhow::Result<()> {
    let before = with_cookie_modal(&coolblue_page(Listing {
        header: "",
        notice: "",
        button: None,
    }));
    let browser = SnapshotBrowser::new().with_consent_page(
        COOLBLUE_URL,
        before,
        coolblue_page(COOLBLUE_IN_STOCK),
    );
    let (runner, sink) = create_test_runner();

    let records = runner.run_all(&browser, &["coolbluenl"]).await;

    assert_eq!(records[0].availability(), Availability::Available);
    let stats = browser.stats();
    assert_eq!(stats.clicks.len(), 1);
    assert_eq!(stats.navigations.len(), 2);
    assert!(sink
        .events_for("coolbluenl")
        .iter()
        .any(|e| e.message == "Detected prompt to consent to cookies"));
    Ok(())
}

#[tokio::test]
async fn test_retailer_without_consent_selector_navigates_once() -> anyhow::Result<()> {
    let mut plain = retailers::mediamarkt_nl();
    plain.consent_prompt_selector = None;
    let registry = RetailerRegistry::builtin().with_overrides(&[plain]);
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(registry, sink.clone());
    let browser = in_stock_browser();

    let records = runner.run_all(&browser, &["mediamarktnl"]).await;

    assert_eq!(records[0].availability(), Availability::Available);
    let stats = browser.stats();
    assert!(stats.clicks.is_empty());
    assert_eq!(stats.navigations, vec![MEDIAMARKT_URL.to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_ambiguous_bol_button_is_unavailable() -> anyhow::Result<()> {
    let page = bol_page(BOL_IN_STOCK).replace(r#"data-client-width="60""#, r#"data-client-width="147""#);
    let browser = SnapshotBrowser::new().with_page(BOL_URL, page);
    let (runner, _sink) = create_test_runner();

    let records = runner.run_all(&browser, &["bolnl"]).await;

    // exists(absent) is false; text_contains(absent) is unknown
    assert_eq!(
        results(&records[0]),
        vec![TriState::True, TriState::False, TriState::Unknown]
    );
    assert_eq!(records[0].availability(), Availability::Unavailable);
    Ok(())
}

#[tokio::test]
async fn test_digital_edition_has_no_builtin_retailers() -> anyhow::Result<()> {
    let browser = in_stock_browser();
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(
        RetailerRegistry::builtin().for_edition(Edition::Digital),
        sink.clone(),
    );

    let records = runner.run_all(&browser, &["bolnl", "coolbluenl"]).await;

    assert!(records
        .iter()
        .all(|r| matches!(r, JobRecord::LookupFailed { .. })));
    assert_eq!(browser.stats().sessions_opened, 0);
    assert!(browser.stats().browser_closed);
    Ok(())
}
