#![allow(dead_code)]

use chrono::Utc;
use cmsctl::config::Config;
use cmsctl::db::{Store, timestamp};
use cmsctl::entities::{contents, plugins, prelude::*, roles, settings, terms};
use cmsctl::state::AppContext;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

/// Fresh migrated in-memory database plus a config pointing at it.
///
/// A single pooled connection keeps every query on the same database.
pub async fn test_context(configure: impl FnOnce(&mut Config)) -> AppContext {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    configure(&mut config);

    AppContext::from_config(config)
        .await
        .expect("failed to create app context")
}

pub async fn insert_content(store: &Store, title: &str, body: &str, status: &str) -> i64 {
    let row = contents::ActiveModel {
        title: Set(title.to_string()),
        body: Set(body.to_string()),
        status: Set(status.to_string()),
        content_type: Set("page".to_string()),
        updated_at: Set(timestamp(Utc::now())),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("insert content");
    row.id
}

pub async fn insert_term(store: &Store, taxonomy: &str, name: &str) -> i64 {
    let row = terms::ActiveModel {
        taxonomy: Set(taxonomy.to_string()),
        name: Set(name.to_string()),
        slug: Set(name.to_lowercase().replace(' ', "-")),
        description: Set(Some(format!("Everything about {name}"))),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("insert term");
    row.id
}

pub async fn insert_role(store: &Store, name: &str) -> i64 {
    let row = roles::ActiveModel {
        name: Set(name.to_string()),
        display_name: Set(name.to_uppercase()),
        description: Set(None),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("insert role");
    row.id
}

pub async fn insert_setting(store: &Store, key: &str, value: &str) -> i64 {
    let row = settings::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        group_name: Set("general".to_string()),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("insert setting");
    row.id
}

pub async fn insert_plugin(store: &Store, name: &str, active: bool) -> i64 {
    let row = plugins::ActiveModel {
        name: Set(name.to_string()),
        version: Set("1.0.0".to_string()),
        description: Set(None),
        active: Set(active),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .expect("insert plugin");
    row.id
}

pub async fn delete_content(store: &Store, id: i64) {
    Contents::delete_by_id(id)
        .exec(&store.conn)
        .await
        .expect("delete content");
}

/// Records an analytics row `age_days` in the past.
pub async fn insert_search(store: &Store, query: &str, age_days: i64, successful: bool) {
    store
        .analytics()
        .record(
            query,
            3,
            12,
            successful,
            Utc::now() - chrono::Duration::days(age_days),
        )
        .await
        .expect("insert analytics");
}
