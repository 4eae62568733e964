use crate::entities::{contents, plugins, prelude::*, roles, settings, terms};
use crate::models::{EntityKind, EntityRecord};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Value,
};
use std::str::FromStr;

/// `field = value` restriction applied to counts and chunked reads.
#[derive(Debug, Clone)]
pub struct EntityFilter {
    pub field: String,
    pub value: Value,
}

impl EntityFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

trait ToRecord {
    fn to_record(&self) -> EntityRecord;
}

fn attributes<T: serde::Serialize>(model: &T) -> serde_json::Value {
    serde_json::to_value(model).unwrap_or(serde_json::Value::Null)
}

impl ToRecord for contents::Model {
    fn to_record(&self) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Content,
            id: self.id,
            title: self.title.clone(),
            body: self.body.clone(),
            category: self.content_type.clone(),
            attributes: attributes(self),
        }
    }
}

impl ToRecord for terms::Model {
    fn to_record(&self) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Term,
            id: self.id,
            title: self.name.clone(),
            body: self.description.clone().unwrap_or_default(),
            category: self.taxonomy.clone(),
            attributes: attributes(self),
        }
    }
}

impl ToRecord for roles::Model {
    fn to_record(&self) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Role,
            id: self.id,
            title: self.display_name.clone(),
            body: self
                .description
                .clone()
                .unwrap_or_else(|| self.name.clone()),
            category: "role".to_string(),
            attributes: attributes(self),
        }
    }
}

impl ToRecord for settings::Model {
    fn to_record(&self) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Setting,
            id: self.id,
            title: self.key.clone(),
            body: self.value.clone(),
            category: self.group_name.clone(),
            attributes: attributes(self),
        }
    }
}

impl ToRecord for plugins::Model {
    fn to_record(&self) -> EntityRecord {
        EntityRecord {
            kind: EntityKind::Plugin,
            id: self.id,
            title: self.name.clone(),
            body: self.description.clone().unwrap_or_default(),
            category: "plugin".to_string(),
            attributes: attributes(self),
        }
    }
}

fn records<M: ToRecord>(rows: &[M]) -> Vec<EntityRecord> {
    rows.iter().map(ToRecord::to_record).collect()
}

fn filtered<E>(filter: Option<&EntityFilter>) -> Result<Select<E>, DbErr>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    let mut query = E::find();
    if let Some(filter) = filter {
        let column = E::Column::from_str(&filter.field)
            .map_err(|_| DbErr::Custom(format!("Unknown filter column '{}'", filter.field)))?;
        query = query.filter(column.eq(filter.value.clone()));
    }
    Ok(query)
}

/// Keyset page: rows with `id > after_id`, primary key ascending.
///
/// Rows inserted while a reindex walks the table land after the cursor,
/// so nothing is skipped or visited twice.
fn chunk<E>(
    id: E::Column,
    after_id: i64,
    limit: u64,
    filter: Option<&EntityFilter>,
) -> Result<Select<E>, DbErr>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    Ok(filtered::<E>(filter)?
        .filter(id.gt(after_id))
        .order_by_asc(id)
        .limit(limit))
}

/// Read-only access to the owner tables.
///
/// Only `count`, keyset chunks and an equality filter are exposed; nothing
/// in the maintenance core needs more.
pub struct EntityRepository {
    conn: DatabaseConnection,
}

impl EntityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self, kind: EntityKind) -> Result<u64, DbErr> {
        self.count_where(kind, None).await
    }

    pub async fn count_where(
        &self,
        kind: EntityKind,
        filter: Option<&EntityFilter>,
    ) -> Result<u64, DbErr> {
        match kind {
            EntityKind::Content => filtered::<Contents>(filter)?.count(&self.conn).await,
            EntityKind::Term => filtered::<Terms>(filter)?.count(&self.conn).await,
            EntityKind::Role => filtered::<Roles>(filter)?.count(&self.conn).await,
            EntityKind::Setting => filtered::<Settings>(filter)?.count(&self.conn).await,
            EntityKind::Plugin => filtered::<Plugins>(filter)?.count(&self.conn).await,
        }
    }

    pub async fn chunk_after(
        &self,
        kind: EntityKind,
        after_id: i64,
        limit: u64,
        filter: Option<&EntityFilter>,
    ) -> Result<Vec<EntityRecord>, DbErr> {
        let rows = match kind {
            EntityKind::Content => records(
                &chunk::<Contents>(contents::Column::Id, after_id, limit, filter)?
                    .all(&self.conn)
                    .await?,
            ),
            EntityKind::Term => records(
                &chunk::<Terms>(terms::Column::Id, after_id, limit, filter)?
                    .all(&self.conn)
                    .await?,
            ),
            EntityKind::Role => records(
                &chunk::<Roles>(roles::Column::Id, after_id, limit, filter)?
                    .all(&self.conn)
                    .await?,
            ),
            EntityKind::Setting => records(
                &chunk::<Settings>(settings::Column::Id, after_id, limit, filter)?
                    .all(&self.conn)
                    .await?,
            ),
            EntityKind::Plugin => records(
                &chunk::<Plugins>(plugins::Column::Id, after_id, limit, filter)?
                    .all(&self.conn)
                    .await?,
            ),
        };

        Ok(rows)
    }

    /// Walks every matching row in keyset chunks and collects them.
    pub async fn all(
        &self,
        kind: EntityKind,
        chunk_size: u64,
        filter: Option<&EntityFilter>,
    ) -> Result<Vec<EntityRecord>, DbErr> {
        let mut out = Vec::new();
        let mut cursor = 0;

        loop {
            let rows = self.chunk_after(kind, cursor, chunk_size, filter).await?;
            let Some(last) = rows.last() else {
                break;
            };
            cursor = last.id;
            let done = (rows.len() as u64) < chunk_size;
            out.extend(rows);
            if done {
                break;
            }
        }

        Ok(out)
    }
}
