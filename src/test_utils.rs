//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::{
        database::{create_connection, create_tables},
        statuses::seed_statuses,
    },
    core::{
        cart, category,
        product::{self, NewProduct},
        status::{StatusCatalog, Statuses},
    },
    entities::{self, Category, Person, Product},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized and the
/// status reference data seeded.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = create_connection("sqlite::memory:").await?;
    create_tables(&db).await?;
    seed_statuses(&db).await?;
    Ok(db)
}

/// Sets up a test database and resolves the status ids.
/// Returns (db, statuses) for workflow tests.
pub async fn setup_with_statuses() -> Result<(DatabaseConnection, Statuses)> {
    let db = setup_test_db().await?;
    let statuses = StatusCatalog::new().load_statuses(&db).await?;
    Ok((db, statuses))
}

/// Sets up a file-backed `SQLite` database with a regular connection pool, so
/// transactions run on separate connections and really contend for locks.
/// The directory is removed when the returned guard is dropped.
pub async fn setup_file_db() -> Result<(tempfile::TempDir, DatabaseConnection, Statuses)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("shop.db").display());
    let db = create_connection(&url).await?;
    create_tables(&db).await?;
    seed_statuses(&db).await?;
    let statuses = StatusCatalog::new().load_statuses(&db).await?;
    Ok((dir, db, statuses))
}

/// Creates a person whose names are derived from the login.
pub async fn create_test_person(
    db: &DatabaseConnection,
    login: &str,
) -> Result<entities::person::Model> {
    crate::core::person::create_person(db, login, login, "Tester", None).await
}

/// Finds a person created by [`create_test_person`].
pub async fn person_by_login(
    db: &DatabaseConnection,
    login: &str,
) -> Result<entities::person::Model> {
    Person::find()
        .filter(entities::person::Column::UserLogin.eq(login))
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::not_found("person", login))
}

/// Creates a category with a label derived from the code.
pub async fn create_test_category(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, code, &format!("Category {code}")).await
}

/// Creates a product in the shared "test" category.
///
/// # Defaults
/// * sku: `SKU-<code>`
/// * price: 9.99
pub async fn create_test_product(
    db: &DatabaseConnection,
    code: &str,
    quantity: i32,
) -> Result<entities::product::Model> {
    let shared = Category::find()
        .filter(entities::category::Column::Code.eq("test"))
        .one(db)
        .await?;
    let category = match shared {
        Some(found) => found,
        None => create_test_category(db, "test").await?,
    };

    product::create_product(
        db,
        NewProduct {
            code: code.to_string(),
            sku: format!("SKU-{code}"),
            label: format!("Product {code}"),
            price: Decimal::new(999, 2),
            quantity,
            category_id: category.id,
            status_id: None,
        },
    )
    .await
}

/// Overwrites the stock of a product, bypassing the workflow.
pub async fn set_product_quantity(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i32,
) -> Result<()> {
    Product::update_many()
        .col_expr(
            entities::product::Column::Quantity,
            sea_orm::sea_query::Expr::value(quantity),
        )
        .filter(entities::product::Column::Id.eq(product_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Returns the person's cart, creating it on first use.
pub async fn create_test_cart(
    db: &DatabaseConnection,
    person: &entities::person::Model,
) -> Result<entities::cart::Model> {
    match cart::get_cart_by_person(db, person.id).await? {
        Some(existing) => Ok(existing),
        None => cart::create_cart(db, person.id).await,
    }
}

/// Adds a `Created` line for a fresh product holding `stock` units.
pub async fn create_cart_item_for(
    db: &DatabaseConnection,
    statuses: &Statuses,
    person: &entities::person::Model,
    product_code: &str,
    stock: i32,
    quantity: i32,
) -> Result<entities::cart_item::Model> {
    create_test_cart(db, person).await?;
    let product = create_test_product(db, product_code, stock).await?;
    cart::add_item(db, statuses, person.id, product.id, quantity).await
}

/// Like [`create_cart_item_for`], creating the person on first use.
pub async fn create_test_cart_item(
    db: &DatabaseConnection,
    statuses: &Statuses,
    login: &str,
    product_code: &str,
    stock: i32,
    quantity: i32,
) -> Result<entities::cart_item::Model> {
    let person = match person_by_login(db, login).await {
        Ok(found) => found,
        Err(_) => create_test_person(db, login).await?,
    };
    create_cart_item_for(db, statuses, &person, product_code, stock, quantity).await
}
