//! Status reference data seeding.
//!
//! The workflow requires every `(enum, value)` pair of [`StatusDomain`] to exist
//! before it runs. Seeding is idempotent: existing rows are left untouched and
//! only missing enumerations or values are inserted.

use crate::{
    core::status::StatusDomain,
    entities::{EnumValue, Enumeration, enum_value, enumeration},
    errors::Result,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

fn enum_label(domain: StatusDomain) -> &'static str {
    match domain {
        StatusDomain::Order => "Order status",
        StatusDomain::OrderItem => "Order item status",
        StatusDomain::CartItem => "Cart item status",
    }
}

/// Inserts any missing status enumerations and values in a single transaction.
///
/// Returns the number of rows inserted.
#[instrument(skip(db))]
pub async fn seed_statuses<C>(db: &C) -> Result<usize>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();
    let mut inserted = 0;

    for domain in StatusDomain::ALL {
        let existing = Enumeration::find()
            .filter(enumeration::Column::Code.eq(domain.enum_code()))
            .one(&txn)
            .await?;

        let enum_id = if let Some(found) = existing {
            found.id
        } else {
            info!("Inserting enumeration '{}'", domain.enum_code());
            inserted += 1;
            enumeration::ActiveModel {
                code: Set(domain.enum_code().to_string()),
                label: Set(enum_label(domain).to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
            .id
        };

        for code in domain.value_codes() {
            let present = EnumValue::find()
                .filter(enum_value::Column::EnumId.eq(enum_id))
                .filter(enum_value::Column::Code.eq(code))
                .one(&txn)
                .await?
                .is_some();
            if present {
                debug!("{}/{} already present", domain.enum_code(), code);
                continue;
            }

            enum_value::ActiveModel {
                code: Set(code.to_string()),
                label: Set(code.to_string()),
                enum_id: Set(enum_id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    txn.commit().await?;
    info!("Status reference data ensured ({} rows inserted)", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::database::{create_connection, create_tables};

    #[tokio::test]
    async fn test_seed_statuses_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // 3 enumerations + 3 + 3 + 4 values
        assert_eq!(seed_statuses(&db).await?, 13);
        assert_eq!(seed_statuses(&db).await?, 0);
        assert_eq!(EnumValue::find().count(&db).await?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_statuses_fills_gaps() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        seed_statuses(&db).await?;

        EnumValue::delete_many()
            .filter(enum_value::Column::Code.eq("Pending"))
            .exec(&db)
            .await?;

        assert_eq!(seed_statuses(&db).await?, 1);
        Ok(())
    }
}
