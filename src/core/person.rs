//! Person business logic - clients and managers referenced by carts and orders.
//!
//! Persons are soft-deleted only. A soft-deleted person is reported as not found
//! by every workflow step.

use crate::{
    entities::{Person, person},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Creates a person after validating the login.
///
/// # Errors
/// `InvalidInput` for an empty login, `Conflict` if the login is already taken.
pub async fn create_person<C: ConnectionTrait>(
    db: &C,
    user_login: &str,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
) -> Result<person::Model> {
    let user_login = user_login.trim();
    if user_login.is_empty() {
        return Err(Error::InvalidInput {
            message: "user login cannot be empty".to_string(),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let created = person::ActiveModel {
        user_login: Set(user_login.to_string()),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        email: Set(email.map(str::to_string)),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(person_id = created.id, "person created");
    Ok(created)
}

/// Finds a person by id, including soft-deleted ones.
pub async fn get_person_by_id<C: ConnectionTrait>(
    db: &C,
    person_id: i64,
) -> Result<Option<person::Model>> {
    Person::find_by_id(person_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a person that has not been soft-deleted.
///
/// # Errors
/// `NotFound` if the person does not exist or is soft-deleted.
pub async fn require_active_person<C: ConnectionTrait>(
    db: &C,
    person_id: i64,
) -> Result<person::Model> {
    get_person_by_id(db, person_id)
        .await?
        .filter(|p| p.deleted_at.is_none())
        .ok_or_else(|| Error::not_found("person", person_id))
}

/// Marks a person as deleted. Their carts and orders are kept.
pub async fn soft_delete_person<C: ConnectionTrait>(
    db: &C,
    person_id: i64,
) -> Result<person::Model> {
    let found = require_active_person(db, person_id).await?;

    let now = chrono::Utc::now().naive_utc();
    let mut active: person::ActiveModel = found.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    info!(person_id, "person soft-deleted");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_person_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_person(&db, "   ", "A", "B", None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_person_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let person = create_person(&db, " alice ", "Alice", "Liddell", Some("a@example.com"))
            .await?;
        assert_eq!(person.user_login, "alice");
        assert_eq!(person.email.as_deref(), Some("a@example.com"));
        assert!(person.deleted_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_login_is_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_person(&db, "bob").await?;

        let result = create_person(&db, "bob", "Other", "Bob", None).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_deleted_person_is_not_active() -> Result<()> {
        let db = setup_test_db().await?;
        let person = create_test_person(&db, "carol").await?;

        let deleted = soft_delete_person(&db, person.id).await?;
        assert!(deleted.deleted_at.is_some());

        // Still stored, but no longer usable
        assert!(get_person_by_id(&db, person.id).await?.is_some());
        let result = require_active_person(&db, person.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "person", .. })));

        let again = soft_delete_person(&db, person.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));
        Ok(())
    }
}
