//! Order assembly and the order state machine.
//!
//! An order is built from a subset of a client's `Created` cart lines and then
//! decided by a manager: approval debits stock for every line, cancellation
//! leaves stock alone. Each step runs in one unit of work, so a failure on any
//! line (typically `InsufficientStock`) leaves every row as it was.
//!
//! Lock order inside a transaction is always: order row, then order items in
//! ascending id, then each item's product row.

use crate::{
    core::{
        cart_item, person,
        status::{CartItemStatus, OrderStatus, Statuses, StatusValue},
        stock,
        uow::UnitOfWork,
    },
    entities::{Cart, Order, OrderItem, order, order_item},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// An order, its decoded status and its lines in ascending id order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: order::Model,
    pub status: OrderStatus,
    pub items: Vec<order_item::Model>,
}

/// Optional criteria for [`list_orders`]; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderFilter {
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Submits a subset of the client's cart lines as a new `InProgress` order.
///
/// # Errors
/// - `InvalidInput` for an empty or repeating `cart_item_ids`
/// - `NotFound` for an unknown client or cart line
/// - `InvalidState` if a line is not `Created`
/// - `Conflict` if a line sits in another person's cart
#[instrument(skip(uow, statuses, details))]
pub async fn create_order<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    client_id: i64,
    cart_item_ids: Vec<i64>,
    details: Option<String>,
) -> Result<order::Model> {
    if cart_item_ids.is_empty() {
        return Err(Error::InvalidInput {
            message: "an order needs at least one cart item".to_string(),
        });
    }
    let unique: BTreeSet<i64> = cart_item_ids.iter().copied().collect();
    if unique.len() != cart_item_ids.len() {
        return Err(Error::InvalidInput {
            message: "cart item ids must not repeat".to_string(),
        });
    }

    let statuses = *statuses;
    let ids: Vec<i64> = unique.into_iter().collect();
    uow.into()
        .run(move |txn| Box::pin(create_order_in(txn, statuses, client_id, ids, details)))
        .await
}

async fn create_order_in(
    txn: &DatabaseTransaction,
    statuses: Statuses,
    client_id: i64,
    cart_item_ids: Vec<i64>,
    details: Option<String>,
) -> Result<order::Model> {
    person::require_active_person(txn, client_id).await?;

    let mut lines = Vec::with_capacity(cart_item_ids.len());
    for id in &cart_item_ids {
        lines.push(cart_item::require_cart_item(txn, *id).await?);
    }

    for line in &lines {
        let status = statuses.cart_item_status(line.status_id)?;
        if status != CartItemStatus::Created {
            return Err(Error::InvalidState {
                message: format!("cart item {} is {status}, expected Created", line.id),
            });
        }
    }

    for line in &lines {
        let owner = Cart::find_by_id(line.cart_id)
            .one(txn)
            .await?
            .ok_or_else(|| Error::not_found("cart", line.cart_id))?;
        if owner.person_id != client_id {
            return Err(Error::Conflict {
                message: format!(
                    "cart item {} does not belong to client {client_id}",
                    line.id
                ),
            });
        }
    }

    let now = chrono::Utc::now().naive_utc();
    let created = order::ActiveModel {
        client_id: Set(client_id),
        manager_id: Set(None),
        details: Set(details),
        status_id: Set(statuses.order(OrderStatus::InProgress)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for line in lines {
        order_item::ActiveModel {
            order_id: Set(created.id),
            cart_item_id: Set(line.id),
            status_id: Set(statuses.order_item(OrderStatus::InProgress)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        cart_item::transition_cart_item(txn, &statuses, line, CartItemStatus::Pending).await?;
    }

    info!(
        order_id = created.id,
        client_id,
        lines = cart_item_ids.len(),
        "order created"
    );
    Ok(created)
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Approves or cancels an `InProgress` order on behalf of a manager.
///
/// Approval debits stock for every line; cancellation only moves statuses.
/// Either way the order, all of its items and their cart lines end in the
/// same terminal state, and `manager_id` records the decision maker.
///
/// # Errors
/// - `NotFound` for an unknown order or manager
/// - `InvalidTransition` if the order is already decided or `target` is `InProgress`
/// - `InsufficientStock` if any line cannot be covered; nothing is written then
#[instrument(skip(uow, statuses))]
pub async fn change_order_status<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    order_id: i64,
    manager_id: i64,
    target: OrderStatus,
) -> Result<order::Model> {
    let statuses = *statuses;
    uow.into()
        .run(move |txn| {
            Box::pin(change_order_status_in(
                txn, statuses, order_id, manager_id, target,
            ))
        })
        .await
}

async fn change_order_status_in(
    txn: &DatabaseTransaction,
    statuses: Statuses,
    order_id: i64,
    manager_id: i64,
    target: OrderStatus,
) -> Result<order::Model> {
    // Two deciders on the same order queue up here; the loser sees a terminal state.
    let locked = Order::find_by_id(order_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;

    person::require_active_person(txn, manager_id).await?;

    let from = statuses.order_status(locked.status_id)?;
    if !from.can_transition_to(target) {
        return Err(Error::InvalidTransition {
            from: from.code().to_string(),
            to: target.code().to_string(),
        });
    }

    for item in items_for_order(txn, order_id).await? {
        transition_order_item(txn, &statuses, item, target).await?;
    }

    let mut active: order::ActiveModel = locked.into();
    active.status_id = Set(statuses.order(target));
    active.manager_id = Set(Some(manager_id));
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = active.update(txn).await?;

    info!(order_id, manager_id, %from, to = %target, "order status changed");
    Ok(updated)
}

/// Moves one order item to a terminal state, together with its cart line.
///
/// Approving debits the product stock by the cart line quantity.
///
/// # Errors
/// `InvalidTransition` if the item is not `InProgress` or `to` is not terminal,
/// `InsufficientStock` on approval of an uncovered line.
pub async fn transition_order_item(
    txn: &DatabaseTransaction,
    statuses: &Statuses,
    item: order_item::Model,
    to: OrderStatus,
) -> Result<order_item::Model> {
    let from = statuses.order_item_status(item.status_id)?;
    let mirrored = CartItemStatus::mirroring(to);
    let line_status = match mirrored {
        Some(line_status) if from.can_transition_to(to) => line_status,
        _ => {
            return Err(Error::InvalidTransition {
                from: from.code().to_string(),
                to: to.code().to_string(),
            });
        }
    };

    let line = if to == OrderStatus::Approved {
        stock::debit_for_order_item(txn, &item).await?
    } else {
        cart_item::require_cart_item(txn, item.cart_item_id).await?
    };
    cart_item::transition_cart_item(txn, statuses, line, line_status).await?;

    let mut active: order_item::ActiveModel = item.into();
    active.status_id = Set(statuses.order_item(to));
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(txn).await.map_err(Into::into)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub async fn get_order<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))
}

/// Lines of an order in ascending id order.
pub async fn items_for_order<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_order_with_items<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    order_id: i64,
) -> Result<OrderDetails> {
    let order = get_order(db, order_id).await?;
    let status = statuses.order_status(order.status_id)?;
    let items = items_for_order(db, order_id).await?;
    Ok(OrderDetails {
        order,
        status,
        items,
    })
}

/// Orders matching every set field of `filter`, in ascending id order.
pub async fn list_orders<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    filter: OrderFilter,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(client_id) = filter.client_id {
        query = query.filter(order::Column::ClientId.eq(client_id));
    }
    if let Some(manager_id) = filter.manager_id {
        query = query.filter(order::Column::ManagerId.eq(manager_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(order::Column::StatusId.eq(statuses.order(status)));
    }

    query
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn list_by_client<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    client_id: i64,
) -> Result<Vec<order::Model>> {
    let filter = OrderFilter {
        client_id: Some(client_id),
        ..OrderFilter::default()
    };
    list_orders(db, statuses, filter).await
}

pub async fn list_by_manager<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    manager_id: i64,
) -> Result<Vec<order::Model>> {
    let filter = OrderFilter {
        manager_id: Some(manager_id),
        ..OrderFilter::default()
    };
    list_orders(db, statuses, filter).await
}

pub async fn list_by_status<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    status: OrderStatus,
) -> Result<Vec<order::Model>> {
    let filter = OrderFilter {
        status: Some(status),
        ..OrderFilter::default()
    };
    list_orders(db, statuses, filter).await
}

pub async fn list_by_manager_and_status<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    manager_id: i64,
    status: OrderStatus,
) -> Result<Vec<order::Model>> {
    let filter = OrderFilter {
        manager_id: Some(manager_id),
        status: Some(status),
        ..OrderFilter::default()
    };
    list_orders(db, statuses, filter).await
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Deletes a decided order and its items. Cart lines are kept.
///
/// # Errors
/// `NotFound` for an unknown order, `InvalidState` while it is `InProgress`.
#[instrument(skip(uow, statuses))]
pub async fn delete_order<'a>(
    uow: impl Into<UnitOfWork<'a>>,
    statuses: &Statuses,
    order_id: i64,
) -> Result<()> {
    let statuses = *statuses;
    uow.into()
        .run(move |txn| Box::pin(delete_order_in(txn, statuses, order_id)))
        .await
}

async fn delete_order_in(txn: &DatabaseTransaction, statuses: Statuses, order_id: i64) -> Result<()> {
    let found = get_order(txn, order_id).await?;
    let status = statuses.order_status(found.status_id)?;
    if !status.is_terminal() {
        warn!(order_id, "refusing to delete an undecided order");
        return Err(Error::InvalidState {
            message: format!("order {order_id} is {status}; only decided orders can be deleted"),
        });
    }

    let removed = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(txn)
        .await?;
    Order::delete_by_id(order_id).exec(txn).await?;

    info!(order_id, items = removed.rows_affected, "order deleted");
    Ok(())
}
