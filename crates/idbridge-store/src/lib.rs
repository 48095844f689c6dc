//! # idbridge-store
//!
//! Local account store boundary.
//!
//! The provisioning pipeline only ever calls the three operations on
//! [`AccountStore`]; everything else about account persistence belongs to
//! the store implementation. Two implementations ship here: a PostgreSQL
//! store whose unique indexes are the authoritative dedup guard, and an
//! in-memory store used by tests.

pub mod memory;
pub mod postgres;
pub mod record;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;
pub use record::{AccountRecord, AccountRole, NewAccount};

use async_trait::async_trait;

/// Operations the provisioning pipeline needs from an account store.
///
/// Lookup misses and lookup failures both surface as `None`; a failed
/// lookup simply forfeits the fast-path dedup check, and the store's own
/// uniqueness constraints remain the real safety net. `insert` returning
/// `None` signals insert failure, not an exception.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Find an account by the identity service's identifier.
    async fn find_by_oauth_sub(&self, oauth_sub: &str) -> Option<AccountRecord>;

    /// Find an account by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> Option<AccountRecord>;

    /// Insert a new account, returning the created record or `None` on
    /// failure (including uniqueness violations).
    async fn insert(&self, account: NewAccount) -> Option<AccountRecord>;
}
