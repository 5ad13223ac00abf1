//! Joining, approving and leaving kennels.

use sqlx::PgConnection;
use tracing::info;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{DomainError, DomainResult, KennelId, MembershipId, UserId};
use crate::domains::consensus::engine;
use crate::domains::consensus::policy::VotingPolicy;
use crate::domains::consensus::ConsensusOutcome;
use crate::domains::kennels::models::{Kennel, Membership};
use crate::kernel::ServerDeps;

/// Add a membership row directly. Fails with `Conflict` if the user already
/// belongs to the kennel.
pub async fn add_membership(
    user_id: UserId,
    kennel_id: KennelId,
    is_approved: bool,
    is_admin: bool,
    deps: &ServerDeps,
) -> DomainResult<Membership> {
    let mut tx = deps.db_pool.begin().await?;
    // Admin additions change the pool the engine counts against.
    Kennel::lock(kennel_id, &mut *tx).await?;

    let membership = Membership::create(user_id, kennel_id, is_approved, is_admin, &mut *tx).await?;
    tx.commit().await?;

    info!(
        membership_id = %membership.id,
        %user_id,
        %kennel_id,
        is_approved,
        is_admin,
        "membership added"
    );
    Ok(membership)
}

/// Ask to join a kennel. The membership waits for an admin's approval.
pub async fn request_membership(
    user_id: UserId,
    kennel_id: KennelId,
    deps: &ServerDeps,
) -> DomainResult<Membership> {
    add_membership(user_id, kennel_id, false, false, deps).await
}

/// Approve a pending request. Approving an approved membership is a no-op.
pub async fn approve_membership(
    approver: UserId,
    membership_id: MembershipId,
    deps: &ServerDeps,
) -> DomainResult<Membership> {
    let mut tx = deps.db_pool.begin().await?;

    let kennel_id = find_membership(membership_id, &mut *tx).await?.kennel_id;
    Actor::new(approver)
        .can(KennelCapability::ManageMembers(kennel_id))
        .check(deps)
        .await?;

    Kennel::lock(kennel_id, &mut *tx).await?;
    let pending = find_membership(membership_id, &mut *tx).await?;
    if pending.is_approved {
        return Ok(pending);
    }

    let membership = Membership::approve(membership_id, &mut *tx).await?;
    tx.commit().await?;

    info!(%membership_id, %approver, %kennel_id, "membership approved");
    Ok(membership)
}

/// Delete a membership. Removing an admin rechecks the kennel's open
/// consensus items in the same transaction.
///
/// The last admin cannot be removed: someone else must be granted admin
/// rights first.
pub async fn remove_membership(
    membership_id: MembershipId,
    deps: &ServerDeps,
) -> DomainResult<Vec<ConsensusOutcome>> {
    let mut tx = deps.db_pool.begin().await?;

    let kennel_id = find_membership(membership_id, &mut *tx).await?.kennel_id;
    Kennel::lock(kennel_id, &mut *tx).await?;
    let membership = find_membership(membership_id, &mut *tx).await?;

    let report = remove_locked(&membership, &deps.voting, &mut *tx).await?;
    tx.commit().await?;

    Ok(report)
}

/// The caller gives up their own membership.
pub async fn leave_kennel(
    user_id: UserId,
    kennel_id: KennelId,
    deps: &ServerDeps,
) -> DomainResult<Vec<ConsensusOutcome>> {
    let mut tx = deps.db_pool.begin().await?;
    Kennel::lock(kennel_id, &mut *tx).await?;

    let membership = Membership::find_for_user(user_id, kennel_id, &mut *tx)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(format!("user {} in kennel {}", user_id, kennel_id))
        })?;

    let report = remove_locked(&membership, &deps.voting, &mut *tx).await?;
    tx.commit().await?;

    Ok(report)
}

async fn find_membership(
    membership_id: MembershipId,
    conn: &mut PgConnection,
) -> DomainResult<Membership> {
    Membership::find_by_id(membership_id, conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("membership {}", membership_id)))
}

/// Caller holds the kennel lock.
async fn remove_locked(
    membership: &Membership,
    policy: &VotingPolicy,
    conn: &mut PgConnection,
) -> DomainResult<Vec<ConsensusOutcome>> {
    if membership.is_admin && Kennel::admin_count(membership.kennel_id, conn).await? <= 1 {
        return Err(DomainError::validation(
            "the last admin cannot leave; grant admin rights to another member first",
        ));
    }

    Membership::delete(membership.id, conn).await?;
    info!(
        membership_id = %membership.id,
        user_id = %membership.user_id,
        kennel_id = %membership.kennel_id,
        was_admin = membership.is_admin,
        "membership removed"
    );

    if !membership.is_admin {
        return Ok(Vec::new());
    }
    engine::recheck_club(membership.kennel_id, membership.user_id, policy, conn).await
}
