//! Product business logic - catalogue entries and the stock they carry.
//!
//! Stock (`quantity`) is only ever lowered by the stock adjuster during order
//! approval; this module provides the row-lock primitive it relies on.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, QueryOrder, QuerySelect, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Input for [`create_product`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub sku: String,
    pub label: String,
    pub price: Decimal,
    pub quantity: i32,
    pub category_id: i64,
    #[serde(default)]
    pub status_id: Option<i64>,
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - code, sku or label is empty or whitespace-only (`InvalidInput`)
/// - the price or the initial stock is negative (`InvalidInput`)
/// - the category does not exist (`NotFound`)
/// - the code or sku is already taken (`Conflict`)
pub async fn create_product<C: ConnectionTrait>(
    db: &C,
    new_product: NewProduct,
) -> Result<product::Model> {
    for (field, value) in [
        ("code", &new_product.code),
        ("sku", &new_product.sku),
        ("label", &new_product.label),
    ] {
        if value.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: format!("product {field} cannot be empty"),
            });
        }
    }

    if new_product.price < Decimal::ZERO {
        return Err(Error::InvalidInput {
            message: format!("price cannot be negative: {}", new_product.price),
        });
    }

    if new_product.quantity < 0 {
        return Err(Error::InvalidInput {
            message: format!("stock cannot be negative: {}", new_product.quantity),
        });
    }

    crate::core::category::get_category_by_id(db, new_product.category_id)
        .await?
        .ok_or_else(|| Error::not_found("category", new_product.category_id))?;

    let now = chrono::Utc::now().naive_utc();
    let created = product::ActiveModel {
        code: Set(new_product.code.trim().to_string()),
        sku: Set(new_product.sku.trim().to_string()),
        label: Set(new_product.label.trim().to_string()),
        price: Set(new_product.price),
        quantity: Set(new_product.quantity),
        category_id: Set(new_product.category_id),
        status_id: Set(new_product.status_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(product_id = created.id, code = %created.code, "product created");
    Ok(created)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_product_by_id`] but a missing product is an error.
pub async fn require_product<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
) -> Result<product::Model> {
    get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Retrieves all products ordered by code.
pub async fn list_products<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a product with an exclusive row lock held until the transaction ends.
///
/// This is `SELECT ... FOR UPDATE` on `PostgreSQL`. `SQLite` has no row locks;
/// there, writers are already serialised by the database-wide write lock.
pub async fn lock_product_for_update(
    txn: &DatabaseTransaction,
    product_id: i64,
) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, TransactionTrait};

    fn new_product(code: &str, price: Decimal, quantity: i32) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            sku: format!("SKU-{code}"),
            label: format!("Label {code}"),
            price,
            quantity,
            category_id: 1,
            status_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(&db, new_product("  ", Decimal::ONE, 1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_product(&db, new_product("P1", Decimal::new(-1, 2), 1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_product(&db, new_product("P1", Decimal::ONE, -3)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "general").await?;

        let product = create_product(
            &db,
            NewProduct {
                category_id: category.id,
                ..new_product("P1", Decimal::new(1250, 2), 10)
            },
        )
        .await?;

        assert_eq!(product.code, "P1");
        assert_eq!(product.sku, "SKU-P1");
        assert_eq!(product.price, Decimal::new(1250, 2));
        assert_eq!(product.quantity, 10);

        let found = require_product(&db, product.id).await?;
        assert_eq!(found.id, product.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_unknown_category() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_product(
            &db,
            NewProduct {
                category_id: 404,
                ..new_product("P1", Decimal::ONE, 1)
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "category", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_code_or_sku_is_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let existing = create_test_product(&db, "P1", 5).await?;

        let same_code = create_product(
            &db,
            NewProduct {
                sku: "OTHER".to_string(),
                category_id: existing.category_id,
                ..new_product("P1", Decimal::ONE, 1)
            },
        )
        .await;
        assert!(matches!(same_code, Err(Error::Conflict { .. })));

        let same_sku = create_product(
            &db,
            NewProduct {
                sku: existing.sku.clone(),
                category_id: existing.category_id,
                ..new_product("P2", Decimal::ONE, 1)
            },
        )
        .await;
        assert!(matches!(same_sku, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_ordered_by_code() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "B", 1).await?;
        create_test_product(&db, "A", 1).await?;

        let codes: Vec<String> = list_products(&db).await?.into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["A".to_string(), "B".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_product_for_update() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "P1", 3).await?;

        let txn = db.begin().await?;
        let locked = lock_product_for_update(&txn, product.id).await?;
        assert_eq!(locked.quantity, 3);
        let missing = lock_product_for_update(&txn, 999).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "product", .. })));
        txn.commit().await?;
        Ok(())
    }
}
