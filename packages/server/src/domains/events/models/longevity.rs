use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{DomainResult, EventId, KennelId, LongevityId, UniqueViolationExt};

use super::event::Event;
use super::longevity_record::LongevityRecord;

/// Credit link: attendance at `event_id` counts toward `kennel_id`'s longevity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Longevity {
    pub id: LongevityId,
    pub event_id: EventId,
    pub kennel_id: KennelId,
}

impl Longevity {
    pub async fn find(
        event_id: EventId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM longevities WHERE event_id = $1 AND kennel_id = $2",
        )
        .bind(event_id)
        .bind(kennel_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_event(
        event_id: EventId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM longevities WHERE event_id = $1 ORDER BY id")
            .bind(event_id)
            .fetch_all(conn)
            .await
            .map_err(Into::into)
    }

    /// Create the credit link and fan out one record per existing attendance.
    ///
    /// Returns the link and the number of records created. Locks the event
    /// row first, so the caller must be inside a transaction.
    pub async fn create(
        event_id: EventId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<(Self, u64)> {
        Event::lock(event_id, &mut *conn).await?;

        let longevity = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO longevities (id, event_id, kennel_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(LongevityId::new())
        .bind(event_id)
        .bind(kennel_id)
        .fetch_one(&mut *conn)
        .await
        .or_conflict(|| {
            format!(
                "event {} already counts toward kennel {}",
                event_id, kennel_id
            )
        })?;

        let records = LongevityRecord::fan_out_for_longevity(&longevity, conn).await?;
        Ok((longevity, records))
    }

    /// Delete the link; its records cascade. Returns whether a row existed.
    pub async fn delete(
        event_id: EventId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM longevities WHERE event_id = $1 AND kennel_id = $2")
            .bind(event_id)
            .bind(kennel_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
