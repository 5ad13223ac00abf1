use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{DomainResult, UniqueViolationExt, UserId};

/// User row. Identity lives with the auth provider; this anchors foreign keys
/// and supplies display names for consensus descriptions.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn create(username: &str, conn: &mut PgConnection) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO users (id, username) VALUES ($1, $2) RETURNING *",
        )
        .bind(UserId::new())
        .bind(username)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("username '{}' is taken", username))
    }

    pub async fn find_by_id(id: UserId, conn: &mut PgConnection) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }
}
