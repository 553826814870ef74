//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs; only the composite unique index on
//! reference values is declared by hand.

use crate::entities::{
    Cart, CartItem, Category, EnumValue, Enumeration, Order, OrderItem, Person, Product,
    enum_value,
};
use crate::errors::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database behind `database_url`.
///
/// An in-memory `SQLite` database exists per connection, so such URLs get a pool
/// of exactly one connection; every caller then sees the same tables, and
/// concurrent transactions queue for that connection.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    ensure_sqlite_dir(database_url)?;

    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    debug!("Connecting to database");
    Database::connect(options).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing), parents before children so foreign keys resolve
/// on every backend.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Enumeration).await?;
    create_table(db, &schema, EnumValue).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Person).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Cart).await?;
    create_table(db, &schema, CartItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;

    let value_code_index = Index::create()
        .name("idx_enum_values_enum_id_code")
        .table(EnumValue)
        .col(enum_value::Column::EnumId)
        .col(enum_value::Column::Code)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&value_code_index)).await?;

    info!("Database tables ensured");
    Ok(())
}
