//! Read-only consensus listings. These take no lock.

use serde::Serialize;
use sqlx::PgConnection;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{ConsensusId, DomainError, DomainResult, UserId};
use crate::domains::consensus::models::{Ballot, Consensus, ConsensusView, ConsensusVote};
use crate::domains::consensus::policy::VoteSplit;
use crate::kernel::ServerDeps;

/// An open consensus as shown to the admins voting on it.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusSummary {
    #[serde(flatten)]
    pub view: ConsensusView,
    pub description: String,
    pub split: VoteSplit,
}

/// Open items in every kennel where `user` is an admin, by kennel then action.
pub async fn list_open_for_admin(
    user: UserId,
    deps: &ServerDeps,
) -> DomainResult<Vec<ConsensusSummary>> {
    let mut conn = deps.db_pool.acquire().await?;
    let views = Consensus::find_views_for_admin(user, &mut *conn).await?;

    let mut summaries = Vec::with_capacity(views.len());
    for view in views {
        summaries.push(summarize(view, &mut *conn).await?);
    }
    Ok(summaries)
}

/// One open consensus with its description and split. Only admins of its
/// kennel may look.
pub async fn consensus_summary(
    consensus_id: ConsensusId,
    requester: UserId,
    deps: &ServerDeps,
) -> DomainResult<ConsensusSummary> {
    let mut conn = deps.db_pool.acquire().await?;
    let view = Consensus::find_view(consensus_id, &mut *conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("open consensus {}", consensus_id)))?;

    Actor::new(requester)
        .can(KennelCapability::ViewConsensus(view.consensus.kennel_id))
        .check(deps)
        .await?;

    summarize(view, &mut *conn).await
}

/// Current split of an open consensus.
pub async fn vote_split(
    consensus_id: ConsensusId,
    requester: UserId,
    deps: &ServerDeps,
) -> DomainResult<VoteSplit> {
    Ok(consensus_summary(consensus_id, requester, deps).await?.split)
}

/// The caller's own ballots across kennels.
pub async fn list_ballots_for_voter(user: UserId, deps: &ServerDeps) -> DomainResult<Vec<Ballot>> {
    let mut conn = deps.db_pool.acquire().await?;
    ConsensusVote::find_by_voter(user, &mut *conn).await
}

async fn summarize(view: ConsensusView, conn: &mut PgConnection) -> DomainResult<ConsensusSummary> {
    let tally = ConsensusVote::tally(view.consensus.id, conn).await?;
    Ok(ConsensusSummary {
        description: view.describe(),
        split: VoteSplit::from_tally(&tally),
        view,
    })
}
