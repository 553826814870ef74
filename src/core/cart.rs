//! Cart manager - one cart per client and the lines staged in it.
//!
//! Stock checks made here are advisory: they reject obviously impossible
//! requests early, but nothing is reserved. The binding check happens when an
//! order item is approved.

use crate::{
    core::{
        cart_item, person, product,
        status::{CartItemStatus, Statuses},
        uow::UnitOfWork,
    },
    entities::{Cart, Order, OrderColumn, OrderItem, cart, cart_item as cart_item_entity, order_item},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// A cart together with its lines in ascending id order.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: cart::Model,
    pub items: Vec<cart_item_entity::Model>,
}

pub async fn get_cart_by_person<C: ConnectionTrait>(
    db: &C,
    person_id: i64,
) -> Result<Option<cart::Model>> {
    Cart::find()
        .filter(cart::Column::PersonId.eq(person_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_cart_by_person`] but a missing cart is an error.
pub async fn require_cart<C: ConnectionTrait>(db: &C, person_id: i64) -> Result<cart::Model> {
    get_cart_by_person(db, person_id)
        .await?
        .ok_or_else(|| Error::not_found("cart", format!("of person {person_id}")))
}

/// Creates the cart of a person.
///
/// # Errors
/// `NotFound` for an unknown or soft-deleted person, `Conflict` if the person
/// already has a cart.
#[instrument(skip(db))]
pub async fn create_cart<C: ConnectionTrait>(db: &C, person_id: i64) -> Result<cart::Model> {
    person::require_active_person(db, person_id).await?;

    if get_cart_by_person(db, person_id).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("person {person_id} already has a cart"),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    // A racing insert still trips the unique index and surfaces as Conflict.
    let created = cart::ActiveModel {
        person_id: Set(person_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(cart_id = created.id, person_id, "cart created");
    Ok(created)
}

pub async fn get_cart_with_items<C: ConnectionTrait>(db: &C, person_id: i64) -> Result<CartView> {
    let cart = require_cart(db, person_id).await?;
    let items = cart_item::items_for_cart(db, cart.id).await?;
    Ok(CartView { cart, items })
}

fn ensure_positive(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::InvalidInput {
            message: format!("quantity must be at least 1, got {quantity}"),
        });
    }
    Ok(())
}

async fn ensure_stock_covers<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    quantity: i32,
) -> Result<()> {
    let found = product::require_product(db, product_id).await?;
    if found.quantity < quantity {
        return Err(Error::InsufficientStock {
            product_id,
            available: found.quantity,
            requested: quantity,
        });
    }
    Ok(())
}

/// Adds a product line to the client's cart with status `Created`.
///
/// # Errors
/// - `InvalidInput` if `quantity < 1`
/// - `NotFound` if the client, the product or the client's cart does not exist
/// - `InsufficientStock` if the product cannot currently cover `quantity`
///
/// Never `Conflict`: adding a product that is already in the cart stages a
/// separate line, so each can be ordered on its own.
#[instrument(skip(uow, statuses))]
pub async fn add_item<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    person_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<cart_item_entity::Model> {
    ensure_positive(quantity)?;
    let statuses = *statuses;
    uow.into()
        .run(move |txn| Box::pin(add_item_in(txn, statuses, person_id, product_id, quantity)))
        .await
}

async fn add_item_in(
    txn: &DatabaseTransaction,
    statuses: Statuses,
    person_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<cart_item_entity::Model> {
    person::require_active_person(txn, person_id).await?;
    ensure_stock_covers(txn, product_id, quantity).await?;
    let cart = require_cart(txn, person_id).await?;

    let now = chrono::Utc::now().naive_utc();
    let created = cart_item_entity::ActiveModel {
        cart_id: Set(cart.id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        status_id: Set(statuses.cart_item(CartItemStatus::Created)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    info!(
        cart_item_id = created.id,
        cart_id = cart.id,
        product_id,
        quantity,
        "item added to cart"
    );
    Ok(created)
}

/// Changes the quantity of a line that has not been ordered yet.
///
/// # Errors
/// `InvalidState` once the line has left `Created`; otherwise the same errors
/// as [`add_item`].
#[instrument(skip(uow, statuses))]
pub async fn update_item_quantity<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    cart_item_id: i64,
    quantity: i32,
) -> Result<cart_item_entity::Model> {
    ensure_positive(quantity)?;
    let statuses = *statuses;
    uow.into()
        .run(move |txn| Box::pin(update_item_quantity_in(txn, statuses, cart_item_id, quantity)))
        .await
}

async fn update_item_quantity_in(
    txn: &DatabaseTransaction,
    statuses: Statuses,
    cart_item_id: i64,
    quantity: i32,
) -> Result<cart_item_entity::Model> {
    let item = cart_item::require_cart_item(txn, cart_item_id).await?;
    let status = statuses.cart_item_status(item.status_id)?;
    if status != CartItemStatus::Created {
        return Err(Error::InvalidState {
            message: format!("cart item {cart_item_id} is {status}, only Created lines can change"),
        });
    }
    ensure_stock_covers(txn, item.product_id, quantity).await?;

    let mut active: cart_item_entity::ActiveModel = item.into();
    active.quantity = Set(quantity);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(txn).await.map_err(Into::into)
}

/// Takes a line out of the cart before it is ordered (`Created -> Cancelled`).
///
/// # Errors
/// `NotFound` for an unknown line, `InvalidTransition` if it was already ordered
/// or finished.
#[instrument(skip(uow, statuses))]
pub async fn remove_item<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    cart_item_id: i64,
) -> Result<cart_item_entity::Model> {
    let statuses = *statuses;
    uow.into()
        .run(move |txn| {
            Box::pin(async move {
                let item = cart_item::require_cart_item(txn, cart_item_id).await?;
                cart_item::transition_cart_item(txn, &statuses, item, CartItemStatus::Cancelled)
                    .await
            })
        })
        .await
}

/// Physically deletes a cart line.
///
/// Lines of decided orders referencing it are removed in the same transaction.
///
/// # Errors
/// - `NotFound` for an unknown line
/// - `InvalidState` if an order that is still in progress references it
#[instrument(skip(uow, statuses))]
pub async fn delete_cart_item<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    cart_item_id: i64,
) -> Result<()> {
    let statuses = *statuses;
    uow.into()
        .run(move |txn| Box::pin(delete_cart_item_in(txn, statuses, cart_item_id)))
        .await
}

async fn delete_cart_item_in(
    txn: &DatabaseTransaction,
    statuses: Statuses,
    cart_item_id: i64,
) -> Result<()> {
    let item = cart_item::require_cart_item(txn, cart_item_id).await?;

    let order_ids: Vec<i64> = OrderItem::find()
        .select_only()
        .column(order_item::Column::OrderId)
        .filter(order_item::Column::CartItemId.eq(item.id))
        .into_tuple()
        .all(txn)
        .await?;

    if !order_ids.is_empty() {
        for order in Order::find()
            .filter(OrderColumn::Id.is_in(order_ids))
            .all(txn)
            .await?
        {
            if !statuses.order_status(order.status_id)?.is_terminal() {
                return Err(Error::InvalidState {
                    message: format!(
                        "cart item {cart_item_id} is part of order {} which is still in progress",
                        order.id
                    ),
                });
            }
        }

        let removed = OrderItem::delete_many()
            .filter(order_item::Column::CartItemId.eq(item.id))
            .exec(txn)
            .await?;
        debug!(
            cart_item_id,
            order_items = removed.rows_affected,
            "removed decided order lines"
        );
    }

    cart_item_entity::Entity::delete_by_id(item.id)
        .exec(txn)
        .await?;
    info!(cart_item_id, "cart item deleted");
    Ok(())
}
