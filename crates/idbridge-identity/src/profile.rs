//! User profile as returned by the identity service.
//!
//! The wire `roles` field is polymorphic (scalar string or array of
//! strings); it is normalized to a plain `Vec<String>` here, at the parse
//! boundary, so downstream decision logic never sees the polymorphism.

use serde::Deserialize;

/// Placeholder avatar used when the identity service supplies none.
pub const DEFAULT_PROFILE_IMAGE: &str = "/user.png";

/// Wire shape of the `roles` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RolesField {
    One(String),
    Many(Vec<String>),
}

/// Profile response body, field-for-field as the identity service sends it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawProfile {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "profileImageUrl")]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub roles: Option<RolesField>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// A resolved user profile with field defaults applied.
///
/// Created per resolution attempt and never cached across events.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    /// Identifier minted by the identity service; the local dedup key
    /// (stored as `oauth_sub`).
    pub external_id: String,
    /// Email address; absence is a policy hard-skip, not a parse error.
    pub email: Option<String>,
    /// Display name; defaults to the external id.
    pub display_name: String,
    /// Avatar URL; defaults to [`DEFAULT_PROFILE_IMAGE`].
    pub profile_image_url: String,
    /// Normalized role markers.
    pub roles: Vec<String>,
    /// Whether the account is enabled upstream; defaults to true.
    pub enabled: bool,
}

impl ResolvedProfile {
    /// Apply field defaults to a raw profile.
    ///
    /// `requested_id` is the identifier the event carried; it backs the
    /// `uuid` and `name` fields when the service omits them.
    pub(crate) fn from_raw(raw: RawProfile, requested_id: &str) -> Self {
        let external_id = raw.uuid.unwrap_or_else(|| requested_id.to_string());
        let display_name = raw.name.unwrap_or_else(|| external_id.clone());
        let profile_image_url = raw
            .profile_image_url
            .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string());
        let roles = match raw.roles {
            None => Vec::new(),
            Some(RolesField::One(role)) => vec![role],
            Some(RolesField::Many(roles)) => roles,
        };

        Self {
            external_id,
            email: raw.email,
            display_name,
            profile_image_url,
            roles,
            enabled: raw.enabled.unwrap_or(true),
        }
    }
}
