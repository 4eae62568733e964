//! Command-line interface for cmsctl
//!
//! Command names keep the `cms:<area>:<action>` form operators already
//! script against.

mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cmsctl - CMS search index and cache maintenance
#[derive(Parser)]
#[command(name = "cmsctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default search paths
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the search index for all or selected entity types
    #[command(name = "cms:search:reindex")]
    Reindex {
        /// Rows per batch (1-1000), defaults to search.indexing.batch_size
        #[arg(long)]
        batch_size: Option<u64>,

        /// Entity types to reindex, e.g. --types=content,term
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Show what would be indexed without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Run a search maintenance action
    #[command(name = "cms:search:maintenance")]
    Maintenance {
        /// cleanup, cache-clear, stats or optimize
        action: String,

        /// Retention window in days for cleanup
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Invalidate cache entries by component, tag or everything
    #[command(name = "cms:cache:clear")]
    CacheClear {
        /// Components whose tags are flushed, e.g. --components=users,roles
        #[arg(long, value_delimiter = ',')]
        components: Vec<String>,

        /// Tags to flush
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Flush every configured tag
        #[arg(long)]
        all: bool,

        /// Show cache driver and settings instead of clearing
        #[arg(long)]
        info: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Pre-populate frequently read cache entries
    #[command(name = "cms:cache:warm")]
    CacheWarm {
        /// Items to warm, defaults to cache.warm.items
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,

        /// Rows per chunk for paginated items
        #[arg(long)]
        chunk: Option<u64>,

        /// Pause between chunks in milliseconds
        #[arg(long)]
        delay: Option<u64>,

        /// Write even when the cache is disabled
        #[arg(long)]
        force: bool,
    },

    /// Query the search index
    #[command(name = "cms:search:query")]
    Query {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// Maximum number of hits
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
}

pub use commands::*;
