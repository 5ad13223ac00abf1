use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{DomainError, DomainResult, EventId, KennelId, UniqueViolationExt};

/// Event model - a run hosted by one kennel
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
    pub host_id: KennelId,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Insert the event row only. `events::activities::create_event` also
    /// credits the host kennel with longevity.
    pub async fn create(
        name: &str,
        date: NaiveDate,
        host_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO events (id, name, date, host_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(EventId::new())
        .bind(name)
        .bind(date)
        .bind(host_id)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("kennel {} already hosts an event named '{}'", host_id, name))
    }

    pub async fn find_by_id(id: EventId, conn: &mut PgConnection) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// Lock the event row for the rest of the transaction.
    ///
    /// Attendance inserts and longevity links both fan out over the other
    /// side's rows; taking this lock first means neither misses a row the
    /// other has not committed yet.
    pub async fn lock(id: EventId, conn: &mut PgConnection) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE id = $1 FOR NO KEY UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("event {}", id)))
    }
}
