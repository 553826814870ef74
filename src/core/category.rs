//! Category business logic - minimal reference data for products.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Creates a category.
///
/// # Errors
/// `InvalidInput` for an empty code, `Conflict` if the code already exists.
pub async fn create_category<C: ConnectionTrait>(
    db: &C,
    code: &str,
    label: &str,
) -> Result<category::Model> {
    if code.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "category code cannot be empty".to_string(),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    category::ActiveModel {
        code: Set(code.trim().to_string()),
        label: Set(label.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

pub async fn get_category_by_id<C: ConnectionTrait>(
    db: &C,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn list_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}
