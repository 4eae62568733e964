//! `cms:cache:warm` command handler

use std::process::ExitCode;
use std::time::Duration;

use crate::cli::output::{check_mark, heading, print_json, rule};
use crate::cache::{CacheWarmer, WarmOptions};
use crate::state::AppContext;

pub struct CacheWarmArgs {
    pub items: Vec<String>,
    pub chunk: Option<u64>,
    pub delay: Option<u64>,
    pub force: bool,
}

/// Always exits 0; failed items are reported and logged only.
pub async fn cmd_cache_warm(
    ctx: &AppContext,
    args: CacheWarmArgs,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let warm_config = &ctx.config.cache.warm;
    let items = if args.items.is_empty() {
        warm_config.items.clone()
    } else {
        args.items
    };

    let options = WarmOptions {
        chunk_size: args.chunk.unwrap_or(warm_config.chunk_size),
        delay: Duration::from_millis(args.delay.unwrap_or(warm_config.delay_ms)),
        force: args.force,
    };

    if !ctx.cache.is_enabled() && !options.force && !json {
        println!("Cache is disabled; use --force to warm anyway.");
    }

    let results = CacheWarmer::new(ctx.store.clone(), &ctx.cache)
        .warm(&items, &options)
        .await;

    if json {
        print_json(&results)?;
        return Ok(ExitCode::SUCCESS);
    }

    heading("Cache warm");
    for result in &results {
        match &result.error {
            None => println!(
                "{} {:<20} {} entries",
                check_mark(true),
                result.item,
                result.written
            ),
            Some(error) => println!("{} {:<20} {error}", check_mark(false), result.item),
        }
    }
    rule();
    let warmed = results.iter().filter(|r| r.is_success()).count();
    println!("Warmed: {warmed}, Failed: {}", results.len() - warmed);

    Ok(ExitCode::SUCCESS)
}
