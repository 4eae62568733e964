mod cache_clear;
mod cache_warm;
mod maintenance;
mod query;
mod reindex;

pub use cache_clear::{CacheClearArgs, cmd_cache_clear};
pub use cache_warm::{CacheWarmArgs, cmd_cache_warm};
pub use maintenance::cmd_maintenance;
pub use query::cmd_query;
pub use reindex::{ReindexArgs, cmd_reindex};
