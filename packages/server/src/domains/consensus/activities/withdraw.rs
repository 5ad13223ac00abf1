use super::vote::lock_open;
use crate::common::{ConsensusId, DomainError, DomainResult, UserId};
use crate::domains::consensus::engine;
use crate::domains::consensus::outcome::{Outcome, VoidReason};
use crate::kernel::ServerDeps;

/// The initiator takes back an open consensus.
pub async fn withdraw_consensus(
    consensus_id: ConsensusId,
    actor: UserId,
    deps: &ServerDeps,
) -> DomainResult<Outcome> {
    let mut tx = deps.db_pool.begin().await?;
    let consensus = lock_open(consensus_id, &mut *tx).await?;

    if consensus.initiator_id != actor {
        return Err(DomainError::permission_denied(format!(
            "only the initiator may withdraw consensus {}",
            consensus_id
        )));
    }

    let outcome = engine::void(&consensus, VoidReason::Withdrawn, &mut *tx).await?;
    tx.commit().await?;

    Ok(outcome)
}
