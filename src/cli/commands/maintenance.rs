//! `cms:search:maintenance` command handler

use std::process::ExitCode;

use crate::cli::output::{check_mark, heading, print_json, rule, seconds};
use crate::maintenance::{
    CleanupReport, Confirm, MaintenanceAction, MaintenanceError, MaintenanceOptions,
    MaintenanceOutcome, OptimizeReport, StatsReport,
};
use crate::cache::FlushOutcome;
use crate::state::AppContext;

pub async fn cmd_maintenance(
    ctx: &AppContext,
    action: &str,
    options: MaintenanceOptions,
    json: bool,
    confirm: &dyn Confirm,
) -> anyhow::Result<ExitCode> {
    let action = match action.parse::<MaintenanceAction>() {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let run = match ctx.maintenance().run(action, &options, confirm).await {
        Ok(run) => run,
        Err(e @ (MaintenanceError::Validation(_) | MaintenanceError::Locked(_))) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&run)?;
    } else {
        match &run.outcome {
            MaintenanceOutcome::Cleanup(report) => print_cleanup(report),
            MaintenanceOutcome::CacheClear(outcome) => print_cache_clear(outcome),
            MaintenanceOutcome::Stats(report) => print_stats(report),
            MaintenanceOutcome::Optimize(report) => print_optimize(report),
        }
        println!();
        println!("Completed '{}' in {}", run.action, seconds(run.elapsed));
    }

    Ok(if run.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_cleanup(report: &CleanupReport) {
    heading(&format!("Analytics cleanup (older than {} days)", report.days));
    println!("Cutoff:      {}", report.cutoff);
    println!("Candidates:  {}", report.candidates);
    if report.cancelled {
        println!("Cancelled, nothing deleted.");
    } else {
        println!("Deleted:     {}", report.deleted);
    }
}

fn print_cache_clear(outcome: &FlushOutcome) {
    heading("Cache clear");
    let removed = outcome
        .removed
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    println!("Mode:        {:?}", outcome.mode);
    println!("Removed:     {removed}");
    for pattern in &outcome.failed_patterns {
        println!("  ✗ could not clear {pattern}");
    }
}

fn print_stats(report: &StatsReport) {
    heading("Search index");
    for (kind, count) in &report.index_counts {
        println!("{kind:<12} {count:>10}");
    }
    rule();
    println!("{:<12} {:>10}", "total", report.total_entries);

    let Some(analytics) = &report.analytics else {
        println!();
        println!("Search analytics are disabled.");
        return;
    };

    println!();
    heading(&format!("Search analytics (last {} days)", analytics.window_days));
    println!("Searches:          {}", analytics.summary.total_searches);
    println!("Avg execution:     {:.1} ms", analytics.summary.avg_execution_ms);
    println!("Avg results:       {:.1}", analytics.summary.avg_results);
    println!("Success rate:      {:.1}%", analytics.success_rate);

    if !analytics.popular.is_empty() {
        println!();
        println!("Top queries:");
        for (i, query) in analytics.popular.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, query.query, query.searches);
        }
    }
}

fn print_optimize(report: &OptimizeReport) {
    heading("Orphaned index entries");
    for orphan in &report.orphans {
        println!(
            "{} {:<12} {:>8} removed",
            check_mark(orphan.error.is_none()),
            orphan.kind,
            orphan.removed
        );
        if let Some(error) = &orphan.error {
            println!("    Error: {error}");
        }
    }
    println!("Total removed: {}", report.orphans_removed);

    println!();
    match &report.statistics_error {
        None => println!("{} Statistics refreshed", check_mark(true)),
        Some(error) => println!("{} Statistics refresh failed: {error}", check_mark(false)),
    }

    println!();
    print_cache_clear(&report.cache);
}
