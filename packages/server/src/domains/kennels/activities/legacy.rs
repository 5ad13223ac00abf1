use tracing::info;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{DomainError, DomainResult, KennelId, UserId};
use crate::domains::kennels::models::LegacyLongevity;
use crate::kernel::ServerDeps;

/// Record runs and hares that predate the system. Overwrites earlier values.
pub async fn set_legacy_longevity(
    actor: UserId,
    user_id: UserId,
    kennel_id: KennelId,
    count: i32,
    hares: i32,
    deps: &ServerDeps,
) -> DomainResult<LegacyLongevity> {
    if count < 0 || hares < 0 {
        return Err(DomainError::validation("legacy counts cannot be negative"));
    }
    if hares > count {
        return Err(DomainError::validation("cannot have hared more runs than attended"));
    }

    Actor::new(actor)
        .can(KennelCapability::ManageLongevity(kennel_id))
        .check(deps)
        .await?;

    let mut conn = deps.db_pool.acquire().await?;
    let legacy = LegacyLongevity::upsert(user_id, kennel_id, count, hares, &mut *conn).await?;
    info!(%user_id, %kennel_id, count, hares, %actor, "legacy longevity set");

    Ok(legacy)
}
