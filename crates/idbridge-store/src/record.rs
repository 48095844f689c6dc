//! Account entity types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

/// Role assigned to a provisioned account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Admin,
    User,
}

impl AccountRole {
    /// Convert to the persisted string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("Unknown account role: {other}")),
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted account, owned and mutated only by the store.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    /// Unique identifier for the account.
    pub id: uuid::Uuid,

    /// Email address (unique, case-insensitively).
    pub email: String,

    /// Credential placeholder; the user authenticates through the external
    /// identity token flow, never with this value.
    pub password: String,

    /// Display name.
    pub name: String,

    /// Avatar URL.
    pub profile_image_url: String,

    /// Role string ("admin" or "user").
    pub role: String,

    /// Identifier minted by the identity service (unique).
    pub oauth_sub: String,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Parse the persisted role string.
    #[must_use]
    pub fn account_role(&self) -> Option<AccountRole> {
        self.role.parse().ok()
    }
}

/// A new account to insert.
///
/// The [`Debug`] impl redacts the password placeholder.
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub profile_image_url: String,
    pub role: AccountRole,
    pub oauth_sub: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("profile_image_url", &self.profile_image_url)
            .field("role", &self.role)
            .field("oauth_sub", &self.oauth_sub)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(AccountRole::Admin.as_str(), "admin");
        assert_eq!("admin".parse::<AccountRole>().unwrap(), AccountRole::Admin);
        assert_eq!("user".parse::<AccountRole>().unwrap(), AccountRole::User);
        assert!("superuser".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_account_role_from_record() {
        let record = AccountRecord {
            id: uuid::Uuid::new_v4(),
            email: "a@ex.com".to_string(),
            password: "placeholder".to_string(),
            name: "A".to_string(),
            profile_image_url: "/user.png".to_string(),
            role: "admin".to_string(),
            oauth_sub: "abc-123".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(record.account_role(), Some(AccountRole::Admin));
    }

    #[test]
    fn test_new_account_debug_redacts_password() {
        let account = NewAccount {
            email: "a@ex.com".to_string(),
            password: "throwaway-secret".to_string(),
            name: "A".to_string(),
            profile_image_url: "/user.png".to_string(),
            role: AccountRole::User,
            oauth_sub: "abc-123".to_string(),
        };
        let rendered = format!("{account:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("throwaway-secret"));
    }
}
