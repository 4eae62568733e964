pub mod prelude;

pub mod cache_entries;
pub mod cache_entry_tags;
pub mod contents;
pub mod maintenance_locks;
pub mod plugins;
pub mod roles;
pub mod search_analytics;
pub mod search_index;
pub mod settings;
pub mod terms;
