//! Mutations a carried consensus performs.
//!
//! Executors re-validate against the current rows: anything may have changed
//! since the consensus was created. A failed re-check is a `Skipped` effect,
//! never an error; the consensus is consumed either way.

use sqlx::PgConnection;
use tracing::{info, warn};

use super::engine::AdminLoss;
use super::models::{Consensus, ConsensusAction};
use super::outcome::{ActionEffect, SkipReason};
use crate::common::{DomainError, DomainResult, EventId};
use crate::domains::events::models::Longevity;
use crate::domains::kennels::models::{Kennel, Membership};

pub(crate) struct Execution {
    pub effect: ActionEffect,
    /// Set when the action took admin rights away from someone.
    pub admin_loss: Option<AdminLoss>,
}

impl Execution {
    fn applied() -> Self {
        Self {
            effect: ActionEffect::Applied,
            admin_loss: None,
        }
    }

    fn skipped(consensus: &Consensus, reason: SkipReason) -> Self {
        warn!(
            consensus_id = %consensus.id,
            action = %consensus.action,
            %reason,
            "consensus carried without effect"
        );
        Self {
            effect: ActionEffect::Skipped { reason },
            admin_loss: None,
        }
    }
}

pub(crate) async fn execute(
    consensus: &Consensus,
    conn: &mut PgConnection,
) -> DomainResult<Execution> {
    match consensus.action {
        ConsensusAction::Kick => kick(consensus, conn).await,
        ConsensusAction::GrantAdmin => grant_admin(consensus, conn).await,
        ConsensusAction::RevokeAdmin => revoke_admin(consensus, conn).await,
        ConsensusAction::AddLongevity => add_longevity(consensus, conn).await,
        ConsensusAction::RemoveLongevity => remove_longevity(consensus, conn).await,
    }
}

/// The target membership. Deleting a membership cascades to the consensus
/// rows naming it, so a carried consensus always finds its target.
async fn target_membership(
    consensus: &Consensus,
    conn: &mut PgConnection,
) -> DomainResult<Membership> {
    let id = consensus.membership_id.ok_or_else(|| {
        DomainError::validation(format!("{} consensus without a membership", consensus.action))
    })?;
    Membership::find_by_id(id, conn)
        .await?
        .filter(|m| m.kennel_id == consensus.kennel_id)
        .ok_or_else(|| DomainError::not_found(format!("membership {}", id)))
}

fn target_event(consensus: &Consensus) -> DomainResult<EventId> {
    consensus.event_id.ok_or_else(|| {
        DomainError::validation(format!("{} consensus without an event", consensus.action))
    })
}

async fn kick(consensus: &Consensus, conn: &mut PgConnection) -> DomainResult<Execution> {
    let membership = target_membership(consensus, conn).await?;

    if membership.is_admin && Kennel::admin_count(consensus.kennel_id, conn).await? <= 1 {
        return Ok(Execution::skipped(consensus, SkipReason::LastAdmin));
    }

    Membership::delete(membership.id, conn).await?;
    info!(
        membership_id = %membership.id,
        user_id = %membership.user_id,
        kennel_id = %membership.kennel_id,
        "member kicked"
    );

    Ok(Execution {
        effect: ActionEffect::Applied,
        admin_loss: membership.is_admin.then_some(AdminLoss {
            kennel_id: membership.kennel_id,
            user_id: membership.user_id,
        }),
    })
}

async fn grant_admin(consensus: &Consensus, conn: &mut PgConnection) -> DomainResult<Execution> {
    let membership = target_membership(consensus, conn).await?;

    Membership::set_admin(membership.id, true, conn).await?;
    info!(membership_id = %membership.id, user_id = %membership.user_id, "admin granted");

    Ok(Execution::applied())
}

async fn revoke_admin(consensus: &Consensus, conn: &mut PgConnection) -> DomainResult<Execution> {
    let membership = target_membership(consensus, conn).await?;

    if !membership.is_admin {
        return Ok(Execution::skipped(consensus, SkipReason::NotAdmin));
    }
    if Kennel::admin_count(consensus.kennel_id, conn).await? <= 1 {
        return Ok(Execution::skipped(consensus, SkipReason::LastAdmin));
    }

    Membership::set_admin(membership.id, false, conn).await?;
    info!(membership_id = %membership.id, user_id = %membership.user_id, "admin revoked");

    Ok(Execution {
        effect: ActionEffect::Applied,
        admin_loss: Some(AdminLoss {
            kennel_id: membership.kennel_id,
            user_id: membership.user_id,
        }),
    })
}

async fn add_longevity(consensus: &Consensus, conn: &mut PgConnection) -> DomainResult<Execution> {
    let event_id = target_event(consensus)?;

    if Longevity::find(event_id, consensus.kennel_id, conn).await?.is_some() {
        return Ok(Execution::skipped(consensus, SkipReason::AlreadyCredited));
    }

    let (longevity, records) = Longevity::create(event_id, consensus.kennel_id, conn).await?;
    info!(
        longevity_id = %longevity.id,
        %event_id,
        kennel_id = %consensus.kennel_id,
        records,
        "longevity added"
    );

    Ok(Execution::applied())
}

async fn remove_longevity(
    consensus: &Consensus,
    conn: &mut PgConnection,
) -> DomainResult<Execution> {
    let event_id = target_event(consensus)?;

    if !Longevity::delete(event_id, consensus.kennel_id, conn).await? {
        return Ok(Execution::skipped(consensus, SkipReason::NotCredited));
    }
    info!(%event_id, kennel_id = %consensus.kennel_id, "longevity removed");

    Ok(Execution::applied())
}
