use tracing::info;

use crate::common::{DomainResult, KennelId, UserId};
use crate::domains::consensus::engine;
use crate::domains::consensus::outcome::ConsensusOutcome;
use crate::domains::kennels::models::Kennel;
use crate::kernel::ServerDeps;

/// Re-examine a kennel's open items after `user_id` lost admin rights there.
///
/// Membership removal runs this inside its own transaction; this entry point
/// is for admin changes made outside the engine.
pub async fn recheck_club(
    kennel_id: KennelId,
    user_id: UserId,
    deps: &ServerDeps,
) -> DomainResult<Vec<ConsensusOutcome>> {
    let mut tx = deps.db_pool.begin().await?;
    Kennel::lock(kennel_id, &mut *tx).await?;

    let report = engine::recheck_club(kennel_id, user_id, &deps.voting, &mut *tx).await?;
    tx.commit().await?;

    info!(%kennel_id, %user_id, items = report.len(), "kennel recheck complete");
    Ok(report)
}
