//! Status catalog - typed statuses over the `enums` / `enum_values` reference tables.
//!
//! Status columns store the id of an `enum_values` row. The workflow never works
//! with raw ids or code strings directly: each status domain is a Rust enum, and
//! the ids are resolved once (`StatusCatalog::load_statuses`) into a [`Statuses`]
//! value that is copied into every workflow step.
//!
//! The allowed transitions of each lifecycle also live here, next to the states
//! they relate.

use crate::{
    entities::{EnumValue, Enumeration, enum_value, enumeration},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A closed set of status codes stored under one enumeration.
pub trait StatusValue: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every value, in declaration order.
    const ALL: &'static [Self];

    /// Code stored in `enum_values.code`.
    fn code(self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|value| value.code() == code)
    }
}

/// State of an order and, identically, of each of its order items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    InProgress,
    Approved,
    Cancelled,
}

impl OrderStatus {
    /// `Approved` and `Cancelled` are absorbing.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Cancelled)
    }

    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::InProgress, Self::Approved) | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl StatusValue for OrderStatus {
    const ALL: &'static [Self] = &[Self::InProgress, Self::Approved, Self::Cancelled];

    fn code(self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Approved => "Approved",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Lifecycle of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartItemStatus {
    Created,
    Pending,
    Approved,
    Cancelled,
}

impl CartItemStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Cancelled)
    }

    /// ```text
    /// Created -> Pending     enlisted into an order
    /// Pending -> Approved    owning order item approved
    /// Pending -> Cancelled   owning order item cancelled
    /// Created -> Cancelled   removed from the cart before ordering
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Created, Self::Pending)
                | (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Cancelled)
                | (Self::Created, Self::Cancelled)
        )
    }

    /// Cart line state that mirrors a terminal order item state.
    #[must_use]
    pub const fn mirroring(order_item: OrderStatus) -> Option<Self> {
        match order_item {
            OrderStatus::InProgress => None,
            OrderStatus::Approved => Some(Self::Approved),
            OrderStatus::Cancelled => Some(Self::Cancelled),
        }
    }
}

impl StatusValue for CartItemStatus {
    const ALL: &'static [Self] = &[Self::Created, Self::Pending, Self::Approved, Self::Cancelled];

    fn code(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Cancelled => "Cancelled",
        }
    }
}

macro_rules! status_display {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_code(s).ok_or_else(|| Error::InvalidInput {
                    message: format!("unknown {} '{s}'", stringify!($ty)),
                })
            }
        }
    )*};
}

status_display!(OrderStatus, CartItemStatus);

/// The enumerations the workflow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDomain {
    Order,
    OrderItem,
    CartItem,
}

impl StatusDomain {
    pub const ALL: [Self; 3] = [Self::Order, Self::OrderItem, Self::CartItem];

    /// Code stored in `enums.code`.
    #[must_use]
    pub const fn enum_code(self) -> &'static str {
        match self {
            Self::Order => "OrderStatus",
            Self::OrderItem => "OrderItemStatus",
            Self::CartItem => "CartItemStatus",
        }
    }

    #[must_use]
    pub fn value_codes(self) -> Vec<&'static str> {
        match self {
            Self::Order | Self::OrderItem => {
                OrderStatus::ALL.iter().map(|s| s.code()).collect()
            }
            Self::CartItem => CartItemStatus::ALL.iter().map(|s| s.code()).collect(),
        }
    }
}

/// Resolved status ids, indexed by the typed statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statuses {
    order: [i64; 3],
    order_item: [i64; 3],
    cart_item: [i64; 4],
}

fn reverse<S: StatusValue>(ids: &[i64], status_id: i64, domain: StatusDomain) -> Result<S> {
    ids.iter()
        .position(|&id| id == status_id)
        .map(|index| S::ALL[index])
        .ok_or_else(|| Error::InvalidState {
            message: format!(
                "status id {status_id} is not a known {} value",
                domain.enum_code()
            ),
        })
}

impl Statuses {
    #[must_use]
    pub const fn order(&self, status: OrderStatus) -> i64 {
        self.order[status as usize]
    }

    #[must_use]
    pub const fn order_item(&self, status: OrderStatus) -> i64 {
        self.order_item[status as usize]
    }

    #[must_use]
    pub const fn cart_item(&self, status: CartItemStatus) -> i64 {
        self.cart_item[status as usize]
    }

    pub fn order_status(&self, status_id: i64) -> Result<OrderStatus> {
        reverse(&self.order, status_id, StatusDomain::Order)
    }

    pub fn order_item_status(&self, status_id: i64) -> Result<OrderStatus> {
        reverse(&self.order_item, status_id, StatusDomain::OrderItem)
    }

    pub fn cart_item_status(&self, status_id: i64) -> Result<CartItemStatus> {
        reverse(&self.cart_item, status_id, StatusDomain::CartItem)
    }
}

#[derive(Debug, Default)]
struct CatalogCache {
    ids: HashMap<(String, String), i64>,
    codes: HashMap<i64, String>,
}

/// Process-local, lazily filled lookup of status ids.
///
/// Reference values are append-only, so entries are never invalidated. Two tasks
/// missing on the same key both query the store and insert the same id.
#[derive(Debug, Clone, Default)]
pub struct StatusCatalog {
    cache: Arc<RwLock<CatalogCache>>,
}

impl StatusCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `(enum_code, value_code)` to the id stored in status columns.
    ///
    /// # Errors
    /// `NotFound` when either code is unknown to the reference tables.
    pub async fn resolve<C: ConnectionTrait>(
        &self,
        db: &C,
        enum_code: &str,
        value_code: &str,
    ) -> Result<i64> {
        let key = (enum_code.to_owned(), value_code.to_owned());
        if let Some(id) = self.cache.read().await.ids.get(&key) {
            return Ok(*id);
        }

        let value = EnumValue::find()
            .inner_join(Enumeration)
            .filter(enumeration::Column::Code.eq(enum_code))
            .filter(enum_value::Column::Code.eq(value_code))
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("status", format!("{enum_code}/{value_code}")))?;

        debug!(enum_code, value_code, id = value.id, "status resolved from store");
        let mut cache = self.cache.write().await;
        cache.codes.insert(value.id, value.code);
        cache.ids.insert(key, value.id);
        Ok(value.id)
    }

    /// Reverse lookup of a status id to its value code.
    pub async fn code_of<C: ConnectionTrait>(&self, db: &C, status_id: i64) -> Result<String> {
        if let Some(code) = self.cache.read().await.codes.get(&status_id) {
            return Ok(code.clone());
        }

        let value = EnumValue::find_by_id(status_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("status", status_id))?;

        self.cache
            .write()
            .await
            .codes
            .insert(value.id, value.code.clone());
        Ok(value.code)
    }

    async fn resolve_all<C, S>(&self, db: &C, domain: StatusDomain) -> Result<Vec<i64>>
    where
        C: ConnectionTrait,
        S: StatusValue,
    {
        let mut ids = Vec::with_capacity(S::ALL.len());
        for status in S::ALL {
            ids.push(self.resolve(db, domain.enum_code(), status.code()).await?);
        }
        Ok(ids)
    }

    /// Resolves every status the workflow uses. Called once at startup.
    ///
    /// # Errors
    /// `NotFound` if any required status is missing from the reference tables.
    pub async fn load_statuses<C: ConnectionTrait>(&self, db: &C) -> Result<Statuses> {
        let order = self
            .resolve_all::<C, OrderStatus>(db, StatusDomain::Order)
            .await?;
        let order_item = self
            .resolve_all::<C, OrderStatus>(db, StatusDomain::OrderItem)
            .await?;
        let cart_item = self
            .resolve_all::<C, CartItemStatus>(db, StatusDomain::CartItem)
            .await?;

        let statuses = Statuses {
            order: [order[0], order[1], order[2]],
            order_item: [order_item[0], order_item[1], order_item[2]],
            cart_item: [cart_item[0], cart_item[1], cart_item[2], cart_item[3]],
        };
        info!("Status catalog loaded");
        Ok(statuses)
    }
}
