//! Pure provisioning policy.

use idbridge_identity::ResolvedProfile;
use idbridge_store::AccountRole;

/// Substring that marks a role as administrative, matched
/// case-insensitively against every role marker.
pub const ADMIN_ROLE_MARKER: &str = "ADMIN";

/// Why an event was skipped without an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The upstream account is disabled.
    Disabled,
    /// The profile carries no usable email address.
    MissingEmail,
    /// An account with the same oauth_sub or email already exists.
    Duplicate,
}

impl SkipReason {
    /// Tag used in structured log output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::MissingEmail => "missing_email",
            Self::Duplicate => "duplicate",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account fields derived for a proceeding event.
///
/// The [`Debug`] impl redacts the generated password placeholder.
#[derive(Clone)]
pub struct ProvisionPlan {
    /// Email, lower-cased.
    pub email: String,
    /// Derived role.
    pub role: AccountRole,
    /// Random placeholder credential; never used for authentication in the
    /// intended flow, present only because the store requires one.
    pub password: String,
}

impl std::fmt::Debug for ProvisionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionPlan")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of the provisioning policy for one resolved profile.
#[derive(Debug)]
pub enum ProvisioningDecision {
    /// Do not insert; the reason feeds the skip log line.
    Skip(SkipReason),
    /// Insert with the derived account fields.
    Provision(ProvisionPlan),
}

/// Decide whether and how to provision a resolved profile.
///
/// Pure and deterministic given its inputs, except for the generated
/// password placeholder (tests treat that field as opaque).
#[must_use]
pub fn decide(
    profile: &ResolvedProfile,
    exists_by_oauth_sub: bool,
    exists_by_email: bool,
) -> ProvisioningDecision {
    if !profile.enabled {
        return ProvisioningDecision::Skip(SkipReason::Disabled);
    }

    let email = match usable_email(profile) {
        Some(email) => email,
        None => return ProvisioningDecision::Skip(SkipReason::MissingEmail),
    };

    if exists_by_oauth_sub || exists_by_email {
        return ProvisioningDecision::Skip(SkipReason::Duplicate);
    }

    ProvisioningDecision::Provision(ProvisionPlan {
        email: email.to_lowercase(),
        role: derive_role(&profile.roles),
        password: uuid::Uuid::new_v4().to_string(),
    })
}

/// The profile's email, if present and non-blank.
pub(crate) fn usable_email(profile: &ResolvedProfile) -> Option<&str> {
    profile
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
}

fn derive_role(roles: &[String]) -> AccountRole {
    if roles
        .iter()
        .any(|r| r.to_uppercase().contains(ADMIN_ROLE_MARKER))
    {
        AccountRole::Admin
    } else {
        AccountRole::User
    }
}
