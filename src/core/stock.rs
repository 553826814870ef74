//! Stock adjuster - debits product stock when an order item is approved.
//!
//! The check and the decrement form one critical section: the product row is
//! locked first, then the debit is written with a guarded
//! `UPDATE products SET quantity = quantity - n WHERE id = ? AND quantity >= n`,
//! so even a store without row locks can never persist negative stock.

use crate::{
    core::{cart_item, product},
    entities::{Product, cart_item::Model as CartItemModel, order_item, product as product_entity},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, prelude::*, sea_query::Expr};
use tracing::{debug, instrument, warn};

/// Removes `quantity` units from a product inside the current transaction.
///
/// # Errors
/// `InsufficientStock` if fewer than `quantity` units are available,
/// `NotFound` if the product does not exist.
pub async fn debit_stock(
    txn: &DatabaseTransaction,
    product_id: i64,
    quantity: i32,
) -> Result<product_entity::Model> {
    if quantity < 1 {
        return Err(Error::InvalidInput {
            message: format!("debit quantity must be at least 1, got {quantity}"),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let result = Product::update_many()
        .col_expr(
            product_entity::Column::Quantity,
            Expr::col(product_entity::Column::Quantity).sub(quantity),
        )
        .col_expr(product_entity::Column::UpdatedAt, Expr::value(now))
        .filter(product_entity::Column::Id.eq(product_id))
        .filter(product_entity::Column::Quantity.gte(quantity))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        let current = product::require_product(txn, product_id).await?;
        return Err(Error::InsufficientStock {
            product_id,
            available: current.quantity,
            requested: quantity,
        });
    }

    product::require_product(txn, product_id).await
}

/// Applies the stock effect of approving one order item.
///
/// Loads the bound cart line, locks its product row, checks availability and
/// debits the stock. Returns the cart line so the caller can move it along.
#[instrument(skip(txn, order_item), fields(order_item_id = order_item.id))]
pub async fn debit_for_order_item(
    txn: &DatabaseTransaction,
    order_item: &order_item::Model,
) -> Result<CartItemModel> {
    let line = cart_item::require_cart_item(txn, order_item.cart_item_id).await?;
    let locked = product::lock_product_for_update(txn, line.product_id).await?;

    if locked.quantity < line.quantity {
        warn!(
            product_id = locked.id,
            available = locked.quantity,
            requested = line.quantity,
            "insufficient stock"
        );
        return Err(Error::InsufficientStock {
            product_id: locked.id,
            available: locked.quantity,
            requested: line.quantity,
        });
    }

    let debited = debit_stock(txn, locked.id, line.quantity).await?;
    debug!(
        product_id = debited.id,
        remaining = debited.quantity,
        "stock debited"
    );
    Ok(line)
}
