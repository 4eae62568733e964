//! `cms:cache:clear` command handler

use std::process::ExitCode;

use crate::cli::output::{check_mark, heading, print_json, rule};
use crate::cache::{CacheClearer, ClearTarget};
use crate::maintenance::Confirm;
use crate::state::AppContext;

pub struct CacheClearArgs {
    pub components: Vec<String>,
    pub tags: Vec<String>,
    pub all: bool,
    pub info: bool,
    pub force: bool,
}

/// Settings echoed by `--info`, resolved through the dotted-key lookup.
const INFO_KEYS: &[&str] = &[
    "cms.cache.enabled",
    "cms.cache.driver",
    "cms.cache.prefix",
    "cms.cache.default_ttl_seconds",
    "cms.cache.warm.items",
];

pub async fn cmd_cache_clear(
    ctx: &AppContext,
    args: CacheClearArgs,
    json: bool,
    confirm: &dyn Confirm,
) -> anyhow::Result<ExitCode> {
    if args.info {
        print_info(ctx, json)?;
        return Ok(ExitCode::SUCCESS);
    }

    let targets = ClearTarget::resolve(args.all, &args.components, &args.tags);

    if !args.force
        && targets.contains(&ClearTarget::All)
        && !confirm.confirm("Clear ALL cms cache entries?")
    {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let report = CacheClearer::new(&ctx.cache).clear(&targets).await;

    if json {
        print_json(&report)?;
    } else {
        heading("Cache clear");
        for item in &report.items {
            match &item.error {
                None => {
                    let removed = item
                        .removed
                        .map_or_else(String::new, |n| format!(" ({n} entries)"));
                    println!(
                        "{} {} [{}]{removed}",
                        check_mark(true),
                        item.label,
                        item.tags.join(", ")
                    );
                }
                Some(error) => println!("{} {}: {error}", check_mark(false), item.label),
            }
        }
        rule();
        println!("{}", report.summary());
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_info(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let info = ctx.cache.get_info();
    let stats = ctx.cache.get_stats();

    if json {
        let settings: serde_json::Map<String, serde_json::Value> = INFO_KEYS
            .iter()
            .filter_map(|key| {
                let value = ctx.config.lookup(key)?;
                Some(((*key).to_string(), serde_json::to_value(value).ok()?))
            })
            .collect();
        print_json(&serde_json::json!({
            "info": info,
            "stats": stats,
            "settings": settings,
            "tags": ctx.cache.config().tags,
        }))?;
        return Ok(());
    }

    heading("Cache");
    println!("Enabled:        {}", info.enabled);
    println!("Driver:         {} ({})", info.driver, info.store_class);
    println!("Prefix:         {}", info.prefix);
    println!("Tag support:    {}", info.supports_tags);
    println!("Default TTL:    {}s", info.default_ttl_seconds);

    println!();
    heading("Settings");
    for key in INFO_KEYS {
        let value = ctx
            .config
            .lookup(key)
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!("{key:<32} {value}");
    }

    println!();
    heading("Component tags");
    for (component, tags) in &ctx.cache.config().tags {
        println!("{component:<14} {}", tags.join(", "));
    }

    println!();
    println!(
        "Session stats: {} hits, {} misses, {} writes, {} invalidations",
        stats.hits, stats.misses, stats.writes, stats.invalidations
    );
    Ok(())
}
