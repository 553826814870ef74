//! Person entity - A client (or manager) of the shop.
//!
//! Persons are never hard-deleted; `deleted_at` marks a soft delete and such
//! persons can no longer shop or submit orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Person database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "persons")]
pub struct Model {
    /// Unique identifier for the person
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login handed over by the identity provider
    #[sea_orm(unique)]
    pub user_login: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional contact address
    pub email: Option<String>,
    /// Soft delete marker
    pub deleted_at: Option<DateTime>,
    /// When the person was created
    pub created_at: DateTime,
    /// When the person was last modified
    pub updated_at: DateTime,
}

/// `Person` is referenced by carts and orders; the owning side declares the relation.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
