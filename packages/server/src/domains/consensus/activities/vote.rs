use sqlx::PgConnection;
use tracing::{info, warn};

use crate::common::{ConsensusId, DomainError, DomainResult, UserId};
use crate::domains::consensus::engine;
use crate::domains::consensus::models::{Consensus, ConsensusVote};
use crate::domains::consensus::outcome::Outcome;
use crate::domains::kennels::models::{Kennel, Membership};
use crate::kernel::ServerDeps;

/// Cast or change a ballot, then evaluate.
///
/// Admin rights are re-checked now, not at creation. A voter who lost them
/// has their ballot removed and the item re-evaluated against the smaller
/// pool; that change is committed before `PermissionDenied` is returned.
pub async fn cast_vote(
    consensus_id: ConsensusId,
    voter: UserId,
    vote: bool,
    deps: &ServerDeps,
) -> DomainResult<Outcome> {
    let mut tx = deps.db_pool.begin().await?;
    let consensus = lock_open(consensus_id, &mut *tx).await?;

    if !Membership::is_admin(voter, consensus.kennel_id, &mut *tx).await? {
        let removed = ConsensusVote::delete(consensus.id, voter, &mut *tx).await?;
        let outcome = engine::evaluate(&consensus, &deps.voting, &mut *tx).await?;
        tx.commit().await?;

        warn!(
            %consensus_id,
            %voter,
            ballot_removed = removed,
            ?outcome,
            "vote from non-admin rejected"
        );
        return Err(DomainError::permission_denied(format!(
            "user {} is no longer an admin of kennel {}",
            voter, consensus.kennel_id
        )));
    }

    if ConsensusVote::record(consensus.id, voter, vote, &mut *tx)
        .await?
        .is_none()
    {
        return Err(DomainError::not_found(format!(
            "user {} has no ballot on consensus {}",
            voter, consensus_id
        )));
    }
    info!(%consensus_id, %voter, vote, "ballot cast");

    let outcome = engine::evaluate(&consensus, &deps.voting, &mut *tx).await?;
    tx.commit().await?;

    Ok(outcome)
}

/// Take the kennel lock for an open consensus and return its current row.
///
/// The row is read again under the lock: a concurrent cast may have resolved
/// it while this transaction waited.
pub(super) async fn lock_open(
    consensus_id: ConsensusId,
    conn: &mut PgConnection,
) -> DomainResult<Consensus> {
    let not_open = || DomainError::not_found(format!("open consensus {}", consensus_id));

    let kennel_id = Consensus::find_by_id(consensus_id, conn)
        .await?
        .ok_or_else(not_open)?
        .kennel_id;
    Kennel::lock(kennel_id, conn).await?;

    Consensus::find_by_id(consensus_id, conn)
        .await?
        .ok_or_else(not_open)
}
