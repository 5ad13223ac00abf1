use async_trait::async_trait;
use tracing::debug;

use super::KennelCapability;
use crate::common::{DomainError, DomainResult, KennelId, UserId};

/// Entry point for authorization checks
///
/// Usage:
/// ```ignore
/// Actor::new(user_id)
///     .can(KennelCapability::ManageMembers(kennel_id))
///     .check(deps)
///     .await?;
/// ```
pub struct Actor {
    actor_id: UserId,
}

impl Actor {
    pub fn new(actor_id: UserId) -> Self {
        Self { actor_id }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: KennelCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: UserId,
    capability: KennelCapability,
}

impl CapabilityBuilder {
    /// Perform the authorization check
    pub async fn check<D>(self, deps: &D) -> DomainResult<()>
    where
        D: HasAuthContext,
    {
        let kennel = self.capability.kennel();
        let allowed = if self.capability.requires_admin() {
            deps.is_kennel_admin(self.actor_id, kennel).await?
        } else {
            deps.is_approved_member(self.actor_id, kennel).await?
        };

        if !allowed {
            debug!(actor = %self.actor_id, capability = ?self.capability, "authorization denied");
            let role = if self.capability.requires_admin() {
                "admin"
            } else {
                "member"
            };
            return Err(DomainError::permission_denied(format!(
                "{:?} requires {} rights in kennel {}",
                self.capability, role, kennel
            )));
        }

        Ok(())
    }
}

/// Identity queries the authorization builder needs.
///
/// `ServerDeps` answers from the memberships table; tests swap in fakes.
#[async_trait]
pub trait HasAuthContext: Send + Sync {
    async fn is_kennel_admin(&self, user: UserId, kennel: KennelId) -> DomainResult<bool>;
    async fn is_approved_member(&self, user: UserId, kennel: KennelId) -> DomainResult<bool>;
}
