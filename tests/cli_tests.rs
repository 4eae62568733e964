//! Command handlers and the exit codes they report.

mod common;

use cmsctl::cli::{
    CacheClearArgs, CacheWarmArgs, ReindexArgs, cmd_cache_clear, cmd_cache_warm,
    cmd_maintenance, cmd_reindex,
};
use cmsctl::maintenance::MaintenanceOptions;
use common::{insert_content, insert_search, insert_term, test_context};
use sea_orm::ConnectionTrait;
use std::process::ExitCode;

fn decline(_: &str) -> bool {
    false
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

fn reindex_args(batch_size: Option<u64>) -> ReindexArgs {
    ReindexArgs {
        batch_size,
        types: Vec::new(),
        dry_run: false,
        force: true,
    }
}

fn clear_components(components: &[&str]) -> CacheClearArgs {
    CacheClearArgs {
        components: strings(components),
        tags: Vec::new(),
        all: false,
        info: false,
        force: true,
    }
}

#[tokio::test]
async fn cache_clear_exit_codes() {
    let ctx = test_context(|_| {}).await;

    let code = cmd_cache_clear(&ctx, clear_components(&["bogus"]), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    let code = cmd_cache_clear(&ctx, clear_components(&["users", "bogus"]), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    let code = cmd_cache_clear(&ctx, clear_components(&["users"]), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
}

#[tokio::test]
async fn declined_clear_all_is_not_a_failure() {
    let ctx = test_context(|_| {}).await;
    let args = CacheClearArgs {
        all: true,
        force: false,
        ..clear_components(&[])
    };

    let code = cmd_cache_clear(&ctx, args, false, &decline).await.unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
}

#[tokio::test]
async fn maintenance_exit_codes() {
    let ctx = test_context(|_| {}).await;
    insert_search(&ctx.store, "old query", 40, true).await;

    let code = cmd_maintenance(&ctx, "vacuum", MaintenanceOptions::default(), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    for days in [0, 1_000_000_000] {
        let options = MaintenanceOptions {
            days: Some(days),
            force: true,
        };
        let code = cmd_maintenance(&ctx, "cleanup", options, true, &decline)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::FAILURE, "days = {days}");
    }

    let options = MaintenanceOptions {
        days: Some(30),
        force: true,
    };
    let code = cmd_maintenance(&ctx, "cleanup", options, true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let code = cmd_maintenance(&ctx, "stats", MaintenanceOptions::default(), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
}

#[tokio::test]
async fn reindex_rejects_out_of_range_batch_size() {
    let ctx = test_context(|_| {}).await;
    insert_content(&ctx.store, "Home", "Welcome", "published").await;

    for batch_size in [0, 1001] {
        let code = cmd_reindex(&ctx, reindex_args(Some(batch_size)), true, &decline)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::FAILURE, "batch size {batch_size}");
    }
    assert!(ctx.store.search_index().counts_by_type().await.unwrap().is_empty());

    let code = cmd_reindex(&ctx, reindex_args(Some(1)), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
}

#[tokio::test]
async fn reindex_with_failing_type_exits_nonzero() {
    let ctx = test_context(|_| {}).await;
    insert_content(&ctx.store, "Home", "Welcome", "published").await;
    insert_term(&ctx.store, "category", "News").await;

    // Rows still count, but reading them back fails.
    ctx.store
        .conn
        .execute_unprepared("ALTER TABLE terms DROP COLUMN description")
        .await
        .unwrap();

    let code = cmd_reindex(&ctx, reindex_args(None), true, &decline)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    let counts = ctx.store.search_index().counts_by_type().await.unwrap();
    assert_eq!(counts.get("content"), Some(&1));
}

#[tokio::test]
async fn cache_warm_always_exits_zero() {
    let ctx = test_context(|_| {}).await;

    let args = CacheWarmArgs {
        items: strings(&["all_roles", "everything"]),
        chunk: None,
        delay: Some(0),
        force: false,
    };
    let code = cmd_cache_warm(&ctx, args, true).await.unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
}
