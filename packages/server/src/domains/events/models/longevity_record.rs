use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{AttendId, DomainResult, KennelId, LongevityId, LongevityRecordId, UserId};

use super::attend::Attend;
use super::longevity::Longevity;

/// Whether one attendance counts toward one kennel's longevity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LongevityRecord {
    pub id: LongevityRecordId,
    pub attend_id: AttendId,
    pub longevity_id: LongevityId,
    pub is_longevity: bool,
}

/// Counted runs and hares for a user in a kennel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RecordedTally {
    pub runs: i64,
    pub hares: i64,
}

/// One kennel's row in a user's cross-kennel summary, legacy kept separate
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct KennelCounts {
    pub kennel_id: KennelId,
    pub kennel_name: String,
    #[sqlx(flatten)]
    pub recorded: RecordedTally,
    pub legacy_runs: i64,
    pub legacy_hares: i64,
}

// Fan-out inserts are a single INSERT ... SELECT so the row count never
// stretches lock duration; ids come from gen_random_uuid() in that statement.

impl LongevityRecord {
    /// One record per attendance at the link's event.
    pub async fn fan_out_for_longevity(
        longevity: &Longevity,
        conn: &mut PgConnection,
    ) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO longevity_records (id, attend_id, longevity_id)
            SELECT gen_random_uuid(), a.id, $1
            FROM attends a
            WHERE a.event_id = $2
            ON CONFLICT (attend_id, longevity_id) DO NOTHING
            "#,
        )
        .bind(longevity.id)
        .bind(longevity.event_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// One record per longevity link of the attendance's event.
    pub async fn fan_out_for_attend(attend: &Attend, conn: &mut PgConnection) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO longevity_records (id, attend_id, longevity_id)
            SELECT gen_random_uuid(), $1, l.id
            FROM longevities l
            WHERE l.event_id = $2
            ON CONFLICT (attend_id, longevity_id) DO NOTHING
            "#,
        )
        .bind(attend.id)
        .bind(attend.event_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_longevity(
        longevity_id: LongevityId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM longevity_records WHERE longevity_id = $1 ORDER BY id",
        )
        .bind(longevity_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Kennel the record credits, via its longevity link.
    pub async fn kennel_of(
        id: LongevityRecordId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<KennelId>> {
        let row = sqlx::query_as::<_, (KennelId,)>(
            r#"
            SELECT l.kennel_id
            FROM longevity_records lr
            JOIN longevities l ON l.id = lr.longevity_id
            WHERE lr.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(kennel,)| kennel))
    }

    pub async fn set_counted(
        id: LongevityRecordId,
        is_longevity: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE longevity_records SET is_longevity = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_longevity)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Counted attendance of a user credited to a kennel.
    pub async fn tally(
        user_id: UserId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<RecordedTally> {
        sqlx::query_as::<_, RecordedTally>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE lr.is_longevity) AS runs,
                COUNT(*) FILTER (WHERE lr.is_longevity AND a.is_hare) AS hares
            FROM longevity_records lr
            JOIN longevities l ON l.id = lr.longevity_id
            JOIN attends a ON a.id = lr.attend_id
            WHERE l.kennel_id = $1 AND a.user_id = $2
            "#,
        )
        .bind(kennel_id)
        .bind(user_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Per-kennel counts for a user: every kennel with a record of their
    /// attendance or a legacy count for them.
    pub async fn summary(
        user_id: UserId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<KennelCounts>> {
        sqlx::query_as::<_, KennelCounts>(
            r#"
            SELECT
                k.id AS kennel_id,
                k.name AS kennel_name,
                COALESCE(r.runs, 0) AS runs,
                COALESCE(r.hares, 0) AS hares,
                COALESCE(ll.count, 0)::BIGINT AS legacy_runs,
                COALESCE(ll.hares, 0)::BIGINT AS legacy_hares
            FROM kennels k
            LEFT JOIN (
                SELECT
                    l.kennel_id,
                    COUNT(*) FILTER (WHERE lr.is_longevity) AS runs,
                    COUNT(*) FILTER (WHERE lr.is_longevity AND a.is_hare) AS hares
                FROM longevity_records lr
                JOIN longevities l ON l.id = lr.longevity_id
                JOIN attends a ON a.id = lr.attend_id
                WHERE a.user_id = $1
                GROUP BY l.kennel_id
            ) r ON r.kennel_id = k.id
            LEFT JOIN legacy_longevity ll ON ll.kennel_id = k.id AND ll.user_id = $1
            WHERE r.kennel_id IS NOT NULL OR ll.id IS NOT NULL
            ORDER BY k.name
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }
}
