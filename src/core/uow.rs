//! Unit of work - the transaction boundary of the order workflow.
//!
//! Every workflow entry point takes `impl Into<UnitOfWork>`: a plain
//! `&DatabaseConnection` starts a new transaction, a `&DatabaseTransaction`
//! joins the caller's. Functions that must run inside a transaction take
//! `&DatabaseTransaction` directly, so "are we in a transaction?" is answered
//! by the type signature.
//!
//! Rollback happens on error, on panic, and when the future is dropped before
//! completion (timeouts, client disconnects): sea-orm rolls back any
//! `DatabaseTransaction` dropped without a commit.

use crate::{config::Isolation, errors::Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::{future::Future, pin::Pin};
use tracing::{debug, warn};

/// Boxed future borrowing the transaction for `'t`.
pub type BoxFuture<'t, T> = Pin<Box<dyn Future<Output = T> + Send + 't>>;

/// Where a workflow step runs: in a fresh transaction or in an enclosing one.
#[derive(Clone, Copy)]
pub enum UnitOfWork<'a> {
    /// Begin (and own) a new transaction on this connection.
    Root {
        db: &'a DatabaseConnection,
        isolation: Isolation,
    },
    /// Run inside an enclosing transaction; commit is the owner's business.
    Joined(&'a DatabaseTransaction),
}

impl<'a> UnitOfWork<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self::Root {
            db,
            isolation: Isolation::ReadCommitted,
        }
    }

    /// Overrides the isolation of a new transaction. No effect when joined.
    #[must_use]
    pub const fn with_isolation(self, isolation: Isolation) -> Self {
        match self {
            Self::Root { db, .. } => Self::Root { db, isolation },
            joined @ Self::Joined(_) => joined,
        }
    }

    #[must_use]
    pub const fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }

    /// Runs `work` inside a transaction and commits if it returns `Ok`.
    ///
    /// When this unit of work owns the transaction, an `Err` rolls it back and is
    /// returned unchanged. When joined, `work` simply runs in the outer
    /// transaction and the outcome is left to its owner.
    pub async fn run<T, F>(self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t DatabaseTransaction) -> BoxFuture<'t, Result<T>> + Send,
    {
        match self {
            Self::Joined(txn) => work(txn).await,
            Self::Root { db, isolation } => {
                let level = isolation.level_for(db.get_database_backend());
                let txn = db.begin_with_config(level, None).await?;

                match work(&txn).await {
                    Ok(value) => {
                        txn.commit().await?;
                        debug!("transaction committed");
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = txn.rollback().await {
                            warn!(error = %rollback_err, "rollback failed");
                        }
                        debug!(error = %err, "transaction rolled back");
                        Err(err)
                    }
                }
            }
        }
    }
}

impl<'a> From<&'a DatabaseConnection> for UnitOfWork<'a> {
    fn from(db: &'a DatabaseConnection) -> Self {
        Self::new(db)
    }
}

impl<'a> From<&'a DatabaseTransaction> for UnitOfWork<'a> {
    fn from(txn: &'a DatabaseTransaction) -> Self {
        Self::Joined(txn)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::person,
        entities::Person,
        errors::Error,
        test_utils::{create_test_person, setup_test_db},
    };
    use sea_orm::{EntityTrait, PaginatorTrait};

    async fn insert_person(txn: &DatabaseTransaction, login: &'static str) -> Result<i64> {
        Ok(person::create_person(txn, login, "Test", "Person", None)
            .await?
            .id)
    }

    #[tokio::test]
    async fn test_commit_on_ok() -> Result<()> {
        let db = setup_test_db().await?;

        let id = UnitOfWork::from(&db)
            .run(|txn| Box::pin(insert_person(txn, "committed")))
            .await?;

        assert!(Person::find_by_id(id).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_on_err() -> Result<()> {
        let db = setup_test_db().await?;

        let result: Result<()> = UnitOfWork::from(&db)
            .run(|txn| {
                Box::pin(async move {
                    insert_person(txn, "rolled_back").await?;
                    Err::<(), Error>(Error::Conflict {
                        message: "abort".to_string(),
                    })
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert_eq!(Person::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_joined_work_shares_the_outer_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let result: Result<()> = UnitOfWork::from(&db)
            .run(|txn| {
                Box::pin(async move {
                    let inner = UnitOfWork::from(txn);
                    assert!(inner.is_joined());
                    inner
                        .run(|txn| Box::pin(insert_person(txn, "inner")))
                        .await?;
                    // The inner insert is visible here and goes away with the outer rollback.
                    assert_eq!(Person::find().count(txn).await?, 1);
                    Err::<(), Error>(Error::InvalidState {
                        message: "outer fails".to_string(),
                    })
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(Person::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_future_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_person(&db, "before").await?;

        let slow = UnitOfWork::from(&db).run(|txn| {
            Box::pin(async move {
                insert_person(txn, "never_committed").await?;
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Ok::<(), Error>(())
            })
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), slow).await;
        assert!(timed_out.is_err());

        assert_eq!(Person::find().count(&db).await?, 1);
        Ok(())
    }
}
