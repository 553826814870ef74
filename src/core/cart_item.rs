//! Cart item lifecycle - loading cart lines and moving them between statuses.

use crate::{
    core::status::{CartItemStatus, Statuses, StatusValue},
    entities::{CartItem, cart_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

pub async fn get_cart_item_by_id<C: ConnectionTrait>(
    db: &C,
    cart_item_id: i64,
) -> Result<Option<cart_item::Model>> {
    CartItem::find_by_id(cart_item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_cart_item_by_id`] but a missing line is an error.
pub async fn require_cart_item<C: ConnectionTrait>(
    db: &C,
    cart_item_id: i64,
) -> Result<cart_item::Model> {
    get_cart_item_by_id(db, cart_item_id)
        .await?
        .ok_or_else(|| Error::not_found("cart item", cart_item_id))
}

/// All lines of a cart, in ascending id order, whatever their status.
pub async fn items_for_cart<C: ConnectionTrait>(
    db: &C,
    cart_id: i64,
) -> Result<Vec<cart_item::Model>> {
    CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a cart line to `to`, refusing edges the lifecycle does not define.
///
/// # Errors
/// `InvalidTransition` for an undefined edge, `InvalidState` if the stored
/// status id is not a cart item status.
pub async fn transition_cart_item<C: ConnectionTrait>(
    db: &C,
    statuses: &Statuses,
    item: cart_item::Model,
    to: CartItemStatus,
) -> Result<cart_item::Model> {
    let from = statuses.cart_item_status(item.status_id)?;
    if !from.can_transition_to(to) {
        return Err(Error::InvalidTransition {
            from: from.code().to_string(),
            to: to.code().to_string(),
        });
    }

    let item_id = item.id;
    let mut active: cart_item::ActiveModel = item.into();
    active.status_id = Set(statuses.cart_item(to));
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = active.update(db).await?;

    debug!(cart_item_id = item_id, %from, %to, "cart item transitioned");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_require_cart_item_missing() -> Result<()> {
        let db = setup_test_db().await?;

        let result = require_cart_item(&db, 1).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "cart item", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_created_line_walks_to_approved() -> Result<()> {
        let (db, statuses) = setup_with_statuses().await?;
        let item = create_test_cart_item(&db, &statuses, "alice", "P1", 10, 2).await?;

        let pending = transition_cart_item(&db, &statuses, item, CartItemStatus::Pending).await?;
        assert_eq!(pending.status_id, statuses.cart_item(CartItemStatus::Pending));

        let approved =
            transition_cart_item(&db, &statuses, pending, CartItemStatus::Approved).await?;
        assert_eq!(
            statuses.cart_item_status(approved.status_id)?,
            CartItemStatus::Approved
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_undefined_edges_are_rejected() -> Result<()> {
        let (db, statuses) = setup_with_statuses().await?;
        let item = create_test_cart_item(&db, &statuses, "alice", "P1", 10, 2).await?;

        let result =
            transition_cart_item(&db, &statuses, item.clone(), CartItemStatus::Approved).await;
        match result {
            Err(Error::InvalidTransition { from, to }) => {
                assert_eq!(from, "Created");
                assert_eq!(to, "Approved");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }

        let cancelled =
            transition_cart_item(&db, &statuses, item, CartItemStatus::Cancelled).await?;
        let result =
            transition_cart_item(&db, &statuses, cancelled, CartItemStatus::Pending).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_items_for_cart_in_id_order() -> Result<()> {
        let (db, statuses) = setup_with_statuses().await?;
        let first = create_test_cart_item(&db, &statuses, "alice", "P1", 10, 1).await?;
        let second = create_test_cart_item(&db, &statuses, "alice", "P2", 10, 1).await?;

        let ids: Vec<i64> = items_for_cart(&db, first.cart_id)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        Ok(())
    }
}
