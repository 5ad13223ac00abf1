//! Claiming, assigning and removing attendance records.
//!
//! Every mutation locks the attendance's event first, the same lock the
//! longevity fan-out takes.

use sqlx::PgConnection;
use tracing::info;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{AttendClaimId, AttendId, DomainError, DomainResult, EventId, UserId};
use crate::domains::events::models::{Attend, AttendClaim, Attendee, Event};
use crate::domains::kennels::models::User;
use crate::kernel::ServerDeps;

/// Claim an attendance that was recorded under a name.
///
/// Host admins see the claims and assign the attendance to one claimant.
pub async fn claim_attendance(
    claimant: UserId,
    attend_id: AttendId,
    deps: &ServerDeps,
) -> DomainResult<AttendClaim> {
    let mut tx = deps.db_pool.begin().await?;
    User::find_by_id(claimant, &mut *tx)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {}", claimant)))?;

    let (attend, _) = lock_attend(attend_id, &mut *tx).await?;
    if let Attendee::User(owner) = attend.attendee() {
        return Err(DomainError::conflict(format!(
            "attendance {} already belongs to user {}",
            attend_id, owner
        )));
    }

    let claim = AttendClaim::create(attend_id, claimant, &mut *tx).await?;
    tx.commit().await?;

    info!(claim_id = %claim.id, %attend_id, %claimant, "attendance claimed");
    Ok(claim)
}

/// Take back one's own claim.
pub async fn withdraw_claim(
    claimant: UserId,
    claim_id: AttendClaimId,
    deps: &ServerDeps,
) -> DomainResult<AttendClaim> {
    let mut conn = deps.db_pool.acquire().await?;
    let claim = AttendClaim::find_by_id(claim_id, &mut *conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("claim {}", claim_id)))?;

    if claim.claimant_id != claimant {
        return Err(DomainError::permission_denied("only the claimant may withdraw a claim"));
    }

    AttendClaim::delete(claim_id, &mut *conn).await?;
    info!(%claim_id, attend_id = %claim.attend_id, %claimant, "claim withdrawn");
    Ok(claim)
}

/// Open claims on the event's attendance, for its host admins.
pub async fn claims_for_event(
    actor: UserId,
    event_id: EventId,
    deps: &ServerDeps,
) -> DomainResult<Vec<AttendClaim>> {
    let mut conn = deps.db_pool.acquire().await?;
    let event = Event::find_by_id(event_id, &mut *conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("event {}", event_id)))?;

    Actor::new(actor)
        .can(KennelCapability::ManageEvents(event.host_id))
        .check(deps)
        .await?;

    AttendClaim::find_by_event(event_id, &mut *conn).await
}

/// Hand an unclaimed attendance to a user and clear its claims.
///
/// Longevity records hang off the attendance, so they now count for the user.
pub async fn assign_attendee(
    actor: UserId,
    attend_id: AttendId,
    user_id: UserId,
    deps: &ServerDeps,
) -> DomainResult<Attend> {
    let mut tx = deps.db_pool.begin().await?;
    let (attend, event) = lock_attend(attend_id, &mut *tx).await?;

    Actor::new(actor)
        .can(KennelCapability::ManageEvents(event.host_id))
        .check(deps)
        .await?;

    if attend.user_id.is_some() {
        return Err(DomainError::validation(format!(
            "attendance {} is already assigned",
            attend_id
        )));
    }
    User::find_by_id(user_id, &mut *tx)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {}", user_id)))?;

    let cleared = AttendClaim::delete_for_attend(attend_id, &mut *tx).await?;
    let attend = Attend::assign_user(attend_id, user_id, &mut *tx).await?;
    tx.commit().await?;

    info!(%attend_id, %user_id, %actor, cleared, "attendance assigned");
    Ok(attend)
}

pub async fn set_attendance_hare(
    actor: UserId,
    attend_id: AttendId,
    is_hare: bool,
    deps: &ServerDeps,
) -> DomainResult<Attend> {
    let mut tx = deps.db_pool.begin().await?;
    let (_, event) = lock_attend(attend_id, &mut *tx).await?;

    Actor::new(actor)
        .can(KennelCapability::ManageEvents(event.host_id))
        .check(deps)
        .await?;

    let attend = Attend::set_hare(attend_id, is_hare, &mut *tx).await?;
    tx.commit().await?;

    info!(%attend_id, is_hare, %actor, "hare flag updated");
    Ok(attend)
}

/// Delete an attendance and, by cascade, its claims and longevity records.
///
/// A claimed attendance belongs to its user: only they may delete it. Host
/// admins may delete unclaimed ones.
pub async fn delete_attendance(
    actor: UserId,
    attend_id: AttendId,
    deps: &ServerDeps,
) -> DomainResult<Attend> {
    let mut tx = deps.db_pool.begin().await?;
    let (attend, event) = lock_attend(attend_id, &mut *tx).await?;

    match attend.attendee() {
        Attendee::User(owner) if owner == actor => {}
        Attendee::User(_) => {
            return Err(DomainError::permission_denied(
                "only the attendee may delete a claimed attendance",
            ));
        }
        Attendee::Unclaimed(_) => {
            Actor::new(actor)
                .can(KennelCapability::ManageEvents(event.host_id))
                .check(deps)
                .await?;
        }
    }

    Attend::delete(attend_id, &mut *tx).await?;
    tx.commit().await?;

    info!(%attend_id, event_id = %event.id, %actor, "attendance deleted");
    Ok(attend)
}

/// Lock the attendance's event, then read the attendance under that lock.
async fn lock_attend(
    attend_id: AttendId,
    conn: &mut PgConnection,
) -> DomainResult<(Attend, Event)> {
    let event_id = find_attend(attend_id, conn).await?.event_id;
    let event = Event::lock(event_id, conn).await?;
    let attend = find_attend(attend_id, conn).await?;
    Ok((attend, event))
}

async fn find_attend(attend_id: AttendId, conn: &mut PgConnection) -> DomainResult<Attend> {
    Attend::find_by_id(attend_id, conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("attendance {}", attend_id)))
}
