use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{AttendClaimId, AttendId, DomainResult, EventId, UniqueViolationExt, UserId};

/// A user saying "that unclaimed name was me"
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendClaim {
    pub id: AttendClaimId,
    pub attend_id: AttendId,
    pub claimant_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl AttendClaim {
    pub async fn create(
        attend_id: AttendId,
        claimant_id: UserId,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO attend_claims (id, attend_id, claimant_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(AttendClaimId::new())
        .bind(attend_id)
        .bind(claimant_id)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("user {} already claimed attendance {}", claimant_id, attend_id))
    }

    pub async fn find_by_id(
        id: AttendClaimId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM attend_claims WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// Open claims on any attendance of the event.
    pub async fn find_by_event(
        event_id: EventId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT c.*
            FROM attend_claims c
            JOIN attends a ON a.id = c.attend_id
            WHERE a.event_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(event_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: AttendClaimId, conn: &mut PgConnection) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM attend_claims WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns how many claims were cleared.
    pub async fn delete_for_attend(
        attend_id: AttendId,
        conn: &mut PgConnection,
    ) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM attend_claims WHERE attend_id = $1")
            .bind(attend_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
