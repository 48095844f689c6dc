//! Bus event handler that provisions users.

use crate::policy::{self, ProvisioningDecision};

use async_trait::async_trait;
use idbridge_events::{EventHandler, InboundEvent};
use idbridge_identity::IdentityClient;
use idbridge_store::{AccountStore, NewAccount};
use tracing::{error, info, warn};

/// Handles `user.created` events: resolves the identifier against the
/// identity service, applies the provisioning policy, and inserts into the
/// account store.
pub struct UserCreatedHandler<S: AccountStore> {
    resolver: IdentityClient,
    store: S,
}

impl<S: AccountStore> UserCreatedHandler<S> {
    /// Create a new handler.
    pub fn new(resolver: IdentityClient, store: S) -> Self {
        Self { resolver, store }
    }
}

#[async_trait]
impl<S: AccountStore> EventHandler for UserCreatedHandler<S> {
    async fn handle(
        &self,
        event: InboundEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let external_id = event.value.as_str();

        // Resolver failures propagate to the consumer loop's isolation
        // boundary; a 404 is an informational skip.
        let profile = match self.resolver.resolve(external_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(
                    external_id,
                    topic = %event.topic,
                    partition = event.partition,
                    offset = event.offset,
                    "No profile on identity service, skipping provisioning"
                );
                return Ok(());
            }
            Err(e) => return Err(Box::new(e)),
        };

        // Best-effort dedup fast path; the store's uniqueness constraints
        // remain the authoritative guard.
        let exists_by_oauth_sub = self
            .store
            .find_by_oauth_sub(&profile.external_id)
            .await
            .is_some();
        let exists_by_email = match policy::usable_email(&profile) {
            Some(email) => self.store.find_by_email(email).await.is_some(),
            None => false,
        };

        match policy::decide(&profile, exists_by_oauth_sub, exists_by_email) {
            ProvisioningDecision::Skip(reason) => {
                warn!(
                    oauth_sub = %profile.external_id,
                    reason = %reason,
                    topic = %event.topic,
                    partition = event.partition,
                    offset = event.offset,
                    "Skipping provisioning"
                );
                Ok(())
            }
            ProvisioningDecision::Provision(plan) => {
                let account = NewAccount {
                    email: plan.email,
                    password: plan.password,
                    name: profile.display_name.clone(),
                    profile_image_url: profile.profile_image_url.clone(),
                    role: plan.role,
                    oauth_sub: profile.external_id.clone(),
                };

                match self.store.insert(account).await {
                    Some(record) => {
                        info!(
                            oauth_sub = %record.oauth_sub,
                            email = %record.email,
                            role = %record.role,
                            "Provisioned user from bus event"
                        );
                        Ok(())
                    }
                    None => {
                        // No retry and no dead-letter; the event is dropped.
                        error!(
                            oauth_sub = %profile.external_id,
                            topic = %event.topic,
                            partition = event.partition,
                            offset = event.offset,
                            raw_value = external_id,
                            "Account store rejected insert, event dropped"
                        );
                        Ok(())
                    }
                }
            }
        }
    }
}
