pub use super::cache_entries::Entity as CacheEntries;
pub use super::cache_entry_tags::Entity as CacheEntryTags;
pub use super::contents::Entity as Contents;
pub use super::maintenance_locks::Entity as MaintenanceLocks;
pub use super::plugins::Entity as Plugins;
pub use super::roles::Entity as Roles;
pub use super::search_analytics::Entity as SearchAnalytics;
pub use super::search_index::Entity as SearchIndex;
pub use super::settings::Entity as Settings;
pub use super::terms::Entity as Terms;
