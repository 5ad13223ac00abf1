use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{AttendId, DomainResult, EventId, UniqueViolationExt, UserId};

/// Who attended: a registered user, or a name nobody has claimed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attendee {
    User(UserId),
    Unclaimed(String),
}

/// Attendance record for one attendee at one event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attend {
    pub id: AttendId,
    pub event_id: EventId,
    pub user_id: Option<UserId>,
    pub unclaimed_name: Option<String>,
    pub is_hare: bool,
}

impl Attend {
    pub fn attendee(&self) -> Attendee {
        match (&self.user_id, &self.unclaimed_name) {
            (Some(user), _) => Attendee::User(*user),
            (None, Some(name)) => Attendee::Unclaimed(name.clone()),
            // excluded by the attend_not_claimed_and_unclaimed check constraint
            (None, None) => Attendee::Unclaimed(String::new()),
        }
    }

    pub async fn create(
        event_id: EventId,
        attendee: &Attendee,
        is_hare: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        let (user_id, unclaimed_name) = match attendee {
            Attendee::User(user) => (Some(*user), None),
            Attendee::Unclaimed(name) => (None, Some(name.as_str())),
        };

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO attends (id, event_id, user_id, unclaimed_name, is_hare)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(AttendId::new())
        .bind(event_id)
        .bind(user_id)
        .bind(unclaimed_name)
        .bind(is_hare)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("{:?} is already recorded at event {}", attendee, event_id))
    }

    pub async fn find_by_id(id: AttendId, conn: &mut PgConnection) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM attends WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// Hand an unclaimed attendance to a user. Claims on it are left to the
    /// caller.
    pub async fn assign_user(
        id: AttendId,
        user_id: UserId,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE attends
            SET user_id = $2, unclaimed_name = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("user {} is already recorded at this event", user_id))
    }

    pub async fn set_hare(
        id: AttendId,
        is_hare: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>("UPDATE attends SET is_hare = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(is_hare)
            .fetch_one(conn)
            .await
            .map_err(Into::into)
    }

    /// Claims and longevity records cascade.
    pub async fn delete(id: AttendId, conn: &mut PgConnection) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM attends WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
