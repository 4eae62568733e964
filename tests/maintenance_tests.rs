//! Maintenance actions: retention cleanup, stats and optimize.

mod common;

use cmsctl::maintenance::{
    MaintenanceAction, MaintenanceError, MaintenanceOptions, MaintenanceOutcome,
};
use cmsctl::models::EntityKind;
use cmsctl::search::BatchSize;
use common::{delete_content, insert_content, insert_search, test_context};
use serde_json::{Value, json};
use std::cell::Cell;

fn accept(_: &str) -> bool {
    true
}

fn decline(_: &str) -> bool {
    false
}

fn force(days: i64) -> MaintenanceOptions {
    MaintenanceOptions {
        days: Some(days),
        force: true,
    }
}

#[tokio::test]
async fn cleanup_deletes_only_rows_older_than_window() {
    let ctx = test_context(|_| {}).await;
    insert_search(&ctx.store, "old query", 40, true).await;
    insert_search(&ctx.store, "recent query", 10, true).await;

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Cleanup, &force(30), &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::Cleanup(report) = &run.outcome else {
        panic!("expected cleanup outcome");
    };
    assert_eq!(report.candidates, 1);
    assert_eq!(report.deleted, 1);
    assert!(!report.cancelled);
    assert!(run.is_success());

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    let analytics = ctx.store.analytics();
    assert_eq!(analytics.count_older_than(cutoff).await.unwrap(), 0);
    let remaining = analytics
        .summary_since(chrono::Utc::now() - chrono::Duration::days(365))
        .await
        .unwrap();
    assert_eq!(remaining.total_searches, 1);
}

#[tokio::test]
async fn cleanup_rejects_non_positive_days() {
    let ctx = test_context(|_| {}).await;
    insert_search(&ctx.store, "old query", 40, true).await;

    for days in [0, -5] {
        let err = ctx
            .maintenance()
            .run(MaintenanceAction::Cleanup, &force(days), &accept)
            .await
            .unwrap_err();
        assert!(matches!(err, MaintenanceError::Validation(_)));
    }

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    assert_eq!(
        ctx.store.analytics().count_older_than(cutoff).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn declined_cleanup_keeps_rows() {
    let ctx = test_context(|_| {}).await;
    insert_search(&ctx.store, "old query", 40, true).await;

    let asked = Cell::new(0);
    let confirm = |prompt: &str| {
        asked.set(asked.get() + 1);
        assert!(prompt.contains("1 search analytics records"));
        false
    };
    let options = MaintenanceOptions {
        days: Some(30),
        force: false,
    };

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Cleanup, &options, &confirm)
        .await
        .unwrap();

    let MaintenanceOutcome::Cleanup(report) = &run.outcome else {
        panic!("expected cleanup outcome");
    };
    assert!(report.cancelled);
    assert_eq!(report.deleted, 0);
    assert_eq!(asked.get(), 1);

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    assert_eq!(
        ctx.store.analytics().count_older_than(cutoff).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn cleanup_defaults_to_configured_retention() {
    let ctx = test_context(|config| config.search.analytics.retention_days = 20).await;
    insert_search(&ctx.store, "old query", 25, true).await;

    let options = MaintenanceOptions {
        days: None,
        force: true,
    };
    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Cleanup, &options, &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::Cleanup(report) = &run.outcome else {
        panic!("expected cleanup outcome");
    };
    assert_eq!((report.days, report.deleted), (20, 1));
}

#[tokio::test]
async fn cleanup_rejects_windows_past_the_calendar() {
    let ctx = test_context(|_| {}).await;
    insert_search(&ctx.store, "old query", 40, true).await;

    for days in [36_501, 1_000_000_000, i64::MAX] {
        let err = ctx
            .maintenance()
            .run(MaintenanceAction::Cleanup, &force(days), &accept)
            .await
            .unwrap_err();
        assert!(matches!(err, MaintenanceError::Validation(_)), "{days}: {err}");
    }

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    assert_eq!(
        ctx.store.analytics().count_older_than(cutoff).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn stats_reports_counts_without_mutating() {
    let ctx = test_context(|_| {}).await;
    insert_content(&ctx.store, "Home", "Welcome", "published").await;
    ctx.search()
        .reindex_all(&[EntityKind::Content], BatchSize::default(), |_, _| {})
        .await
        .unwrap();

    for _ in 0..3 {
        insert_search(&ctx.store, "pricing", 1, true).await;
    }
    insert_search(&ctx.store, "docs", 2, false).await;
    insert_search(&ctx.store, "ancient", 90, true).await;

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Stats, &MaintenanceOptions::default(), &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::Stats(report) = &run.outcome else {
        panic!("expected stats outcome");
    };
    assert_eq!(report.index_counts.get("content"), Some(&1));
    assert_eq!(report.index_counts.get("term"), Some(&0));
    assert_eq!(report.total_entries, 1);

    let analytics = report.analytics.as_ref().expect("analytics enabled");
    assert_eq!(analytics.summary.total_searches, 4);
    assert!((analytics.summary.avg_execution_ms - 12.0).abs() < f64::EPSILON);
    assert!((analytics.summary.avg_results - 3.0).abs() < f64::EPSILON);
    assert!((analytics.success_rate - 75.0).abs() < f64::EPSILON);
    assert_eq!(analytics.popular[0].query, "pricing");
    assert_eq!(analytics.popular[0].searches, 3);

    let everything = chrono::Utc::now() - chrono::Duration::days(365);
    let summary = ctx.store.analytics().summary_since(everything).await.unwrap();
    assert_eq!(summary.total_searches, 5);
}

#[tokio::test]
async fn stats_skips_analytics_when_disabled() {
    let ctx = test_context(|config| config.search.analytics.enabled = false).await;

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Stats, &MaintenanceOptions::default(), &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::Stats(report) = &run.outcome else {
        panic!("expected stats outcome");
    };
    assert!(report.analytics.is_none());
}

#[tokio::test]
async fn optimize_reports_three_sub_results() {
    let ctx = test_context(|config| config.cache.driver = "memory".to_string()).await;
    let gone = insert_content(&ctx.store, "Temporary", "Body", "published").await;
    insert_content(&ctx.store, "Permanent", "Body", "published").await;
    ctx.search()
        .reindex_all(&[EntityKind::Content], BatchSize::default(), |_, _| {})
        .await
        .unwrap();
    delete_content(&ctx.store, gone).await;

    ctx.cache
        .put("users", "all", &json!([1, 2]), &Value::Null, false)
        .await;

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::Optimize, &MaintenanceOptions::default(), &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::Optimize(report) = &run.outcome else {
        panic!("expected optimize outcome");
    };
    assert_eq!(report.orphans_removed, 1);
    assert_eq!(report.orphans.len(), EntityKind::ALL.len());
    assert!(report.statistics_error.is_none());
    assert_eq!(report.cache.removed, Some(1));
    assert!(run.is_success());

    assert!(ctx.cache.get("users", "all", &Value::Null).await.is_none());
    assert_eq!(ctx.store.search_index().total().await.unwrap(), 1);
}

#[tokio::test]
async fn cache_clear_action_flushes_every_tag() {
    let ctx = test_context(|_| {}).await;
    ctx.cache
        .put("settings", "all", &json!({"site": "x"}), &Value::Null, false)
        .await;
    ctx.cache
        .put("content", "published", &json!([]), &json!({"page": 1}), false)
        .await;

    let run = ctx
        .maintenance()
        .run(MaintenanceAction::CacheClear, &MaintenanceOptions::default(), &decline)
        .await
        .unwrap();

    let MaintenanceOutcome::CacheClear(outcome) = &run.outcome else {
        panic!("expected cache-clear outcome");
    };
    assert_eq!(outcome.removed, Some(2));
    assert!(run.is_success());
}
