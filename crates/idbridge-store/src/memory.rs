//! In-memory account store.
//!
//! Enforces the same uniqueness rules as the PostgreSQL store so pipeline
//! tests exercise the real insert-failure contract. Clones share storage.

use crate::record::{AccountRecord, NewAccount};
use crate::AccountStore;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Account store holding records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<Vec<AccountRecord>>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    /// Snapshot of all stored accounts.
    pub async fn all(&self) -> Vec<AccountRecord> {
        self.accounts.read().await.clone()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_oauth_sub(&self, oauth_sub: &str) -> Option<AccountRecord> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.oauth_sub == oauth_sub)
            .cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<AccountRecord> {
        let needle = email.to_lowercase();
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.email.to_lowercase() == needle)
            .cloned()
    }

    async fn insert(&self, account: NewAccount) -> Option<AccountRecord> {
        let mut accounts = self.accounts.write().await;

        let email_lower = account.email.to_lowercase();
        let duplicate = accounts
            .iter()
            .any(|a| a.oauth_sub == account.oauth_sub || a.email.to_lowercase() == email_lower);
        if duplicate {
            return None;
        }

        let now = Utc::now();
        let record = AccountRecord {
            id: uuid::Uuid::new_v4(),
            email: account.email,
            password: account.password,
            name: account.name,
            profile_image_url: account.profile_image_url,
            role: account.role.as_str().to_string(),
            oauth_sub: account.oauth_sub,
            created_at: now,
            updated_at: now,
        };
        accounts.push(record.clone());
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AccountRole;

    fn new_account(email: &str, oauth_sub: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password: "placeholder".to_string(),
            name: "Test".to_string(),
            profile_image_url: "/user.png".to_string(),
            role: AccountRole::User,
            oauth_sub: oauth_sub.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryAccountStore::new();
        let record = store
            .insert(new_account("jane@example.com", "sub-1"))
            .await
            .expect("insert should succeed");

        assert_eq!(record.role, "user");
        assert!(store.find_by_oauth_sub("sub-1").await.is_some());
        assert!(store.find_by_oauth_sub("sub-2").await.is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = MemoryAccountStore::new();
        store
            .insert(new_account("Jane@Example.com", "sub-1"))
            .await
            .unwrap();

        assert!(store.find_by_email("jane@example.com").await.is_some());
        assert!(store.find_by_email("JANE@EXAMPLE.COM").await.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_insert_returns_none() {
        let store = MemoryAccountStore::new();
        store
            .insert(new_account("jane@example.com", "sub-1"))
            .await
            .unwrap();

        // same oauth_sub, different email
        assert!(store
            .insert(new_account("other@example.com", "sub-1"))
            .await
            .is_none());
        // same email (different case), different oauth_sub
        assert!(store
            .insert(new_account("JANE@example.com", "sub-2"))
            .await
            .is_none());

        assert_eq!(store.len().await, 1);
    }
}
