//! Enumeration entity - A named family of reference values (e.g. `OrderStatus`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enumeration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enums")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Family code, e.g. `"CartItemStatus"`
    #[sea_orm(unique)]
    pub code: String,
    pub label: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One enumeration has many values
    #[sea_orm(has_many = "super::enum_value::Entity")]
    Values,
}

impl Related<super::enum_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Values.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
