pub mod analytics;
pub mod cache;
pub mod entities;
pub mod locks;
pub mod search_index;
