//! Open a consensus and cast the initiator's yes.

use serde::Serialize;
use sqlx::PgConnection;
use tracing::info;

use crate::common::{DomainError, DomainResult, KennelId, UserId};
use crate::domains::consensus::engine;
use crate::domains::consensus::models::{
    Consensus, ConsensusAction, ConsensusTarget, ConsensusVote,
};
use crate::domains::consensus::outcome::Outcome;
use crate::domains::events::models::{Event, Longevity};
use crate::domains::kennels::models::{Kennel, Membership};
use crate::kernel::ServerDeps;

/// A newly opened consensus and the result of its first evaluation.
///
/// When the initiator is the only admin the outcome is already `Resolved`
/// and `consensus` describes a row that no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub consensus: Consensus,
    pub ballots: u64,
    pub outcome: Outcome,
}

pub async fn create_consensus(
    initiator: UserId,
    kennel_id: KennelId,
    action: ConsensusAction,
    target: ConsensusTarget,
    deps: &ServerDeps,
) -> DomainResult<Proposal> {
    action.validate_target(&target)?;

    let mut tx = deps.db_pool.begin().await?;
    Kennel::lock(kennel_id, &mut *tx).await?;

    if !Membership::is_admin(initiator, kennel_id, &mut *tx).await? {
        return Err(DomainError::permission_denied(format!(
            "user {} is not an admin of kennel {}",
            initiator, kennel_id
        )));
    }

    check_target(kennel_id, action, target, &mut *tx).await?;

    if let Some(open) = Consensus::find_open_for_target(kennel_id, target, &mut *tx).await? {
        return Err(DomainError::conflict(format!(
            "consensus {} ({}) is already open for this target",
            open.id, open.action
        )));
    }

    let consensus = Consensus::create(initiator, kennel_id, action, target, &mut *tx).await?;
    let ballots = ConsensusVote::seed_for_admins(consensus.id, kennel_id, &mut *tx).await?;
    ConsensusVote::record(consensus.id, initiator, true, &mut *tx).await?;

    info!(
        consensus_id = %consensus.id,
        %kennel_id,
        %initiator,
        %action,
        ballots,
        "consensus opened"
    );

    let outcome = engine::evaluate(&consensus, &deps.voting, &mut *tx).await?;
    tx.commit().await?;

    Ok(Proposal {
        consensus,
        ballots,
        outcome,
    })
}

/// Target existence, kennel ownership and action-specific integrity.
async fn check_target(
    kennel_id: KennelId,
    action: ConsensusAction,
    target: ConsensusTarget,
    conn: &mut PgConnection,
) -> DomainResult<()> {
    match target {
        ConsensusTarget::Membership(membership_id) => {
            let membership = Membership::find_by_id(membership_id, conn)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("membership {}", membership_id)))?;

            if membership.kennel_id != kennel_id {
                return Err(DomainError::validation(format!(
                    "membership {} belongs to another kennel",
                    membership_id
                )));
            }

            match action {
                ConsensusAction::GrantAdmin if membership.is_admin => Err(
                    DomainError::validation("member is already an admin"),
                ),
                ConsensusAction::RevokeAdmin if !membership.is_admin => {
                    Err(DomainError::validation("member is not an admin"))
                }
                _ => Ok(()),
            }
        }
        ConsensusTarget::Event(event_id) => {
            Event::find_by_id(event_id, conn)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("event {}", event_id)))?;

            let credited = Longevity::find(event_id, kennel_id, conn).await?.is_some();
            match action {
                ConsensusAction::AddLongevity if credited => Err(DomainError::validation(
                    "event already counts toward this kennel",
                )),
                ConsensusAction::RemoveLongevity if !credited => Err(DomainError::validation(
                    "event does not count toward this kennel",
                )),
                _ => Ok(()),
            }
        }
    }
}
