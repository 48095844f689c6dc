//! PostgreSQL account store.
//!
//! The `accounts` table carries unique indexes on `oauth_sub` and
//! `lower(email)` (see `migrations/`); those constraints, not the in-process
//! lookups, are the authoritative dedup guard. An insert that trips one of
//! them reports failure through the `None` contract rather than an error.

use crate::record::{AccountRecord, NewAccount};
use crate::AccountStore;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, warn};

/// Account store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a store on an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_oauth_sub(&self, oauth_sub: &str) -> Option<AccountRecord> {
        let result: Result<Option<AccountRecord>, sqlx::Error> =
            sqlx::query_as("SELECT * FROM accounts WHERE oauth_sub = $1")
                .bind(oauth_sub)
                .fetch_optional(&self.pool)
                .await;

        match result {
            Ok(record) => record,
            Err(e) => {
                error!(oauth_sub, error = %e, "Account lookup by oauth_sub failed");
                None
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Option<AccountRecord> {
        let result: Result<Option<AccountRecord>, sqlx::Error> =
            sqlx::query_as("SELECT * FROM accounts WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await;

        match result {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "Account lookup by email failed");
                None
            }
        }
    }

    async fn insert(&self, account: NewAccount) -> Option<AccountRecord> {
        let result: Result<AccountRecord, sqlx::Error> = sqlx::query_as(
            "INSERT INTO accounts \
                 (id, email, password, name, profile_image_url, role, oauth_sub) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.name)
        .bind(&account.profile_image_url)
        .bind(account.role.as_str())
        .bind(&account.oauth_sub)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                let unique_violation = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if unique_violation {
                    // Lost the check-then-insert race; the constraint did its job.
                    warn!(
                        oauth_sub = %account.oauth_sub,
                        email = %account.email,
                        "Insert rejected by uniqueness constraint"
                    );
                } else {
                    error!(
                        oauth_sub = %account.oauth_sub,
                        email = %account.email,
                        error = %e,
                        "Account insert failed"
                    );
                }
                None
            }
        }
    }
}
