//! # idbridge-identity
//!
//! Client for the external identity service.
//!
//! Resolving a user takes up to two network round-trips: an OAuth2
//! client-credentials token exchange against the configured token endpoint,
//! then an authenticated profile fetch by external identifier. Tokens are
//! cached in memory until shortly before expiry; correctness never depends
//! on the cache.

pub mod auth;
pub mod client;
pub mod error;
pub mod profile;

pub use auth::{ClientCredentials, TokenSource};
pub use client::IdentityClient;
pub use error::{IdentityError, IdentityResult};
pub use profile::ResolvedProfile;
