use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_index")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning entity kind, e.g. `content` or `term`
    pub searchable_type: String,
    pub searchable_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Space separated, lowercase
    #[sea_orm(column_type = "Text")]
    pub keywords: String,
    #[sea_orm(column_name = "type")]
    pub category: String,
    pub indexed_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
