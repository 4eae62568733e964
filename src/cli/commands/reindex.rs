//! `cms:search:reindex` command handler

use std::process::ExitCode;

use crate::cli::output::{check_mark, heading, print_json, rule, seconds};
use crate::maintenance::Confirm;
use crate::search::{BatchSize, SearchError};
use crate::state::AppContext;

pub struct ReindexArgs {
    pub batch_size: Option<u64>,
    pub types: Vec<String>,
    pub dry_run: bool,
    pub force: bool,
}

pub async fn cmd_reindex(
    ctx: &AppContext,
    args: ReindexArgs,
    json: bool,
    confirm: &dyn Confirm,
) -> anyhow::Result<ExitCode> {
    let search = ctx.search();
    if !search.is_enabled() {
        println!("Search is disabled (cms.search.enabled = false). Nothing to do.");
        return Ok(ExitCode::FAILURE);
    }

    let batch = match BatchSize::try_from(
        args.batch_size
            .unwrap_or(ctx.config.search.indexing.batch_size),
    ) {
        Ok(batch) => batch,
        Err(e) => return Ok(validation_failure(&e)),
    };

    let kinds = match search.resolve_kinds(Some(args.types.as_slice())) {
        Ok(kinds) => kinds,
        Err(e) => return Ok(validation_failure(&e)),
    };

    let estimates = search.estimate_reindex_size(&kinds, batch).await?;

    if args.dry_run {
        if json {
            print_json(&estimates)?;
        } else {
            heading(&format!("Reindex dry run (batch size {})", batch.get()));
            println!("{:<12} {:>10} {:>10}", "Type", "Rows", "Batches");
            for (kind, estimate) in &estimates {
                println!("{:<12} {:>10} {:>10}", kind, estimate.count, estimate.batches);
            }
            rule();
            println!(
                "Total: {} rows",
                estimates.values().map(|e| e.count).sum::<u64>()
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    let total: u64 = estimates.values().map(|e| e.count).sum();
    if !args.force
        && !confirm.confirm(&format!(
            "Rebuild the search index for {total} rows across {} types?",
            kinds.len()
        ))
    {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let report = match search
        .reindex_all(&kinds, batch, |kind, indexed| {
            if !json {
                let expected = estimates.get(&kind).map_or(0, |e| e.count);
                println!("  {kind}: {indexed}/{expected}");
            }
        })
        .await
    {
        Ok(report) => report,
        Err(e @ (SearchError::Locked(_) | SearchError::Disabled)) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&report)?;
    } else {
        println!();
        heading("Reindex summary");
        for outcome in &report.outcomes {
            println!(
                "{} {:<12} {:>8} indexed in {} batches",
                check_mark(outcome.error.is_none()),
                outcome.kind,
                outcome.indexed,
                outcome.batches
            );
            if let Some(error) = &outcome.error {
                println!("    Error: {error}");
            }
        }
        rule();
        println!(
            "Total indexed: {} in {}",
            report.total_indexed,
            seconds(report.elapsed)
        );
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validation_failure(error: &SearchError) -> ExitCode {
    eprintln!("{error}");
    ExitCode::FAILURE
}
