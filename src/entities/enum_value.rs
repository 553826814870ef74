//! Enum value entity - One member of an enumeration.
//!
//! The pair `(enumeration.code, enum_value.code)` is unique and its `id` is what
//! status columns across the schema store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enum value database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enum_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Value code, e.g. `"Pending"`
    pub code: String,
    pub label: String,
    /// Owning enumeration
    pub enum_id: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enumeration::Entity",
        from = "Column::EnumId",
        to = "super::enumeration::Column::Id"
    )]
    Enumeration,
}

impl Related<super::enumeration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enumeration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
