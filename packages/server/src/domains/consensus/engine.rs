//! Evaluation and the admin-loss cascade.
//!
//! Callers hold the kennel row lock (`Kennel::lock`) inside the transaction
//! they pass in. Every function here runs on that one connection, so a whole
//! cascade commits or rolls back together.

use std::collections::VecDeque;

use sqlx::PgConnection;
use tracing::{debug, info};

use super::executors;
use super::models::{Consensus, ConsensusVote};
use super::outcome::{ConsensusOutcome, Outcome, VoidReason};
use super::policy::{Decision, VoteSplit, VotingPolicy};
use crate::common::{DomainResult, KennelId, UserId};

/// A user who stopped being an admin of a kennel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdminLoss {
    pub kennel_id: KennelId,
    pub user_id: UserId,
}

/// Decide a consensus from its ballots and act on the decision, then run any
/// cascade the action started.
pub(crate) async fn evaluate(
    consensus: &Consensus,
    policy: &VotingPolicy,
    conn: &mut PgConnection,
) -> DomainResult<Outcome> {
    let mut losses = VecDeque::new();
    let outcome = evaluate_step(consensus, policy, conn, &mut losses).await?;
    drain(losses, policy, conn).await?;
    Ok(outcome)
}

/// Re-examine a kennel's open items after `user_id` lost admin rights there.
pub(crate) async fn recheck_club(
    kennel_id: KennelId,
    user_id: UserId,
    policy: &VotingPolicy,
    conn: &mut PgConnection,
) -> DomainResult<Vec<ConsensusOutcome>> {
    drain(VecDeque::from([AdminLoss { kennel_id, user_id }]), policy, conn).await
}

/// Delete a consensus without executing it.
pub(crate) async fn void(
    consensus: &Consensus,
    reason: VoidReason,
    conn: &mut PgConnection,
) -> DomainResult<Outcome> {
    Consensus::delete(consensus.id, conn).await?;
    info!(
        consensus_id = %consensus.id,
        kennel_id = %consensus.kennel_id,
        action = %consensus.action,
        ?reason,
        "consensus voided"
    );
    Ok(Outcome::Voided { reason })
}

async fn evaluate_step(
    consensus: &Consensus,
    policy: &VotingPolicy,
    conn: &mut PgConnection,
    losses: &mut VecDeque<AdminLoss>,
) -> DomainResult<Outcome> {
    let tally = ConsensusVote::tally(consensus.id, conn).await?;
    let split = VoteSplit::from_tally(&tally);

    match policy.decide(&tally) {
        Decision::Pending => {
            debug!(
                consensus_id = %consensus.id,
                yes = tally.yes,
                no = tally.no,
                pool_size = tally.pool_size,
                "consensus still pending"
            );
            Ok(Outcome::Pending { split })
        }
        Decision::Carry => {
            let execution = executors::execute(consensus, conn).await?;
            // A kick removes the target membership, which may already have
            // taken this row with it.
            Consensus::delete(consensus.id, conn).await?;
            info!(
                consensus_id = %consensus.id,
                kennel_id = %consensus.kennel_id,
                action = %consensus.action,
                effect = ?execution.effect,
                split = %split.readable(),
                "consensus resolved"
            );
            if let Some(loss) = execution.admin_loss {
                losses.push_back(loss);
            }
            Ok(Outcome::Resolved {
                effect: execution.effect,
            })
        }
        Decision::Reject => {
            Consensus::delete(consensus.id, conn).await?;
            info!(
                consensus_id = %consensus.id,
                kennel_id = %consensus.kennel_id,
                action = %consensus.action,
                split = %split.readable(),
                "consensus rejected"
            );
            Ok(Outcome::Rejected { split })
        }
        Decision::Empty => void(consensus, VoidReason::EmptyPool, conn).await,
    }
}

/// Work through admin losses until none are left. Resolving an item can
/// demote another admin, which queues a further recheck.
async fn drain(
    mut losses: VecDeque<AdminLoss>,
    policy: &VotingPolicy,
    conn: &mut PgConnection,
) -> DomainResult<Vec<ConsensusOutcome>> {
    let mut report = Vec::new();

    while let Some(loss) = losses.pop_front() {
        info!(
            kennel_id = %loss.kennel_id,
            user_id = %loss.user_id,
            "rechecking open consensus after admin loss"
        );

        for listed in Consensus::find_by_kennel(loss.kennel_id, conn).await? {
            // Earlier items in this pass may have deleted it.
            let Some(consensus) = Consensus::find_by_id(listed.id, conn).await? else {
                continue;
            };

            let outcome = if consensus.initiator_id == loss.user_id {
                void(&consensus, VoidReason::InitiatorDemoted, conn).await?
            } else {
                evaluate_step(&consensus, policy, conn, &mut losses).await?
            };

            report.push(ConsensusOutcome {
                consensus_id: consensus.id,
                action: consensus.action,
                outcome,
            });
        }
    }

    Ok(report)
}
