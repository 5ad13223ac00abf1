use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{DomainResult, KennelId, LegacyLongevityId, UserId};

/// Attendance that predates the system, entered by hand per (user, kennel).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LegacyLongevity {
    pub id: LegacyLongevityId,
    pub user_id: UserId,
    pub kennel_id: KennelId,
    pub count: i32,
    pub hares: i32,
}

impl LegacyLongevity {
    pub async fn find(
        user_id: UserId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM legacy_longevity WHERE user_id = $1 AND kennel_id = $2",
        )
        .bind(user_id)
        .bind(kennel_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Insert or overwrite the legacy counts for (user, kennel).
    pub async fn upsert(
        user_id: UserId,
        kennel_id: KennelId,
        count: i32,
        hares: i32,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO legacy_longevity (id, user_id, kennel_id, count, hares)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, kennel_id)
            DO UPDATE SET count = EXCLUDED.count, hares = EXCLUDED.hares
            RETURNING *
            "#,
        )
        .bind(LegacyLongevityId::new())
        .bind(user_id)
        .bind(kennel_id)
        .bind(count)
        .bind(hares)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }
}
