use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{DomainError, DomainResult, EventId, KennelId, UserId};
use crate::domains::events::models::{Attend, Attendee, Event, Longevity, LongevityRecord};
use crate::domains::kennels::models::User;
use crate::kernel::ServerDeps;

/// An event and the longevity link crediting its host
#[derive(Debug, Clone, Serialize)]
pub struct HostedEvent {
    pub event: Event,
    pub longevity: Longevity,
}

/// An attendance and how many longevity records it produced
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAttendance {
    pub attend: Attend,
    pub records: u64,
}

/// Create an event hosted by `host_id`. The host kennel is credited with
/// longevity for it straight away.
pub async fn create_event(
    actor: UserId,
    name: &str,
    date: NaiveDate,
    host_id: KennelId,
    deps: &ServerDeps,
) -> DomainResult<HostedEvent> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("event name is required"));
    }

    Actor::new(actor)
        .can(KennelCapability::ManageEvents(host_id))
        .check(deps)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    let event = Event::create(name, date, host_id, &mut *tx).await?;
    let (longevity, _) = Longevity::create(event.id, host_id, &mut *tx).await?;
    tx.commit().await?;

    info!(event_id = %event.id, %host_id, %date, "event created");
    Ok(HostedEvent { event, longevity })
}

/// Record that someone ran at an event.
///
/// One longevity record is created for every kennel the event already
/// counts toward. The event row stays locked until commit, so a longevity
/// link added concurrently waits and then fans out over this attendance.
pub async fn record_attendance(
    actor: UserId,
    event_id: EventId,
    attendee: Attendee,
    is_hare: bool,
    deps: &ServerDeps,
) -> DomainResult<RecordedAttendance> {
    let event = {
        let mut conn = deps.db_pool.acquire().await?;
        Event::find_by_id(event_id, &mut *conn)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("event {}", event_id)))?
    };

    Actor::new(actor)
        .can(KennelCapability::ManageEvents(event.host_id))
        .check(deps)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    Event::lock(event_id, &mut *tx).await?;

    match &attendee {
        Attendee::User(user_id) => {
            User::find_by_id(*user_id, &mut *tx)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("user {}", user_id)))?;
        }
        Attendee::Unclaimed(name) if name.trim().is_empty() => {
            return Err(DomainError::validation("unclaimed attendee needs a name"));
        }
        Attendee::Unclaimed(_) => {}
    }

    let attend = Attend::create(event_id, &attendee, is_hare, &mut *tx).await?;
    let records = LongevityRecord::fan_out_for_attend(&attend, &mut *tx).await?;
    tx.commit().await?;

    info!(attend_id = %attend.id, %event_id, is_hare, records, "attendance recorded");
    Ok(RecordedAttendance { attend, records })
}
