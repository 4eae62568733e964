//! `cms:search:query` command handler

use std::process::ExitCode;

use crate::cli::output::{heading, print_json};
use crate::search::SearchError;
use crate::state::AppContext;

pub async fn cmd_query(
    ctx: &AppContext,
    terms: &[String],
    limit: u64,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let query = terms.join(" ");

    let results = match ctx.search().search(&query, limit).await {
        Ok(results) => results,
        Err(e @ (SearchError::Validation(_) | SearchError::Disabled)) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&results)?;
        return Ok(ExitCode::SUCCESS);
    }

    if results.hits.is_empty() {
        println!("No results for '{query}'");
        return Ok(ExitCode::SUCCESS);
    }

    heading(&format!(
        "Results for '{query}' ({} hits, {} ms)",
        results.hits.len(),
        results.execution_time_ms
    ));
    for hit in &results.hits {
        println!("{}", hit.title);
        println!(
            "  {}#{} | {} | indexed {}",
            hit.searchable_type, hit.searchable_id, hit.category, hit.indexed_at
        );
    }

    Ok(ExitCode::SUCCESS)
}
