/// Authorization for kennel operations
///
/// Provides a fluent API for checks in activity code:
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, KennelCapability};
///
/// Actor::new(user_id)
///     .can(KennelCapability::ManageEvents(kennel_id))
///     .check(deps)
///     .await?;
/// ```
///
/// Consensus engine operations do not go through here: they re-check admin
/// rights inside their own locked transaction.

mod builder;
mod capability;

pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
pub use capability::KennelCapability;
