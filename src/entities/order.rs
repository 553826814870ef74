//! Order entity - A submitted, manager-reviewable snapshot of cart lines.
//!
//! Orders start `InProgress` and end in `Approved` or `Cancelled`. `manager_id`
//! is filled by whoever made the final decision.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Person who submitted the order
    pub client_id: i64,
    /// Manager who approved or cancelled the order
    pub manager_id: Option<i64>,
    /// Free-form notes from the client
    pub details: Option<String>,
    /// Order status (reference value id)
    pub status_id: i64,
    /// When the order was created
    pub created_at: DateTime,
    /// When the order was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The submitting client
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::ClientId",
        to = "super::person::Column::Id"
    )]
    Client,
    /// The deciding manager, if any
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::ManagerId",
        to = "super::person::Column::Id"
    )]
    Manager,
    /// An order owns its lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
