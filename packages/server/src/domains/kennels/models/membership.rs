use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{DomainResult, KennelId, MembershipId, UniqueViolationExt, UserId};

/// Membership model - a user's standing in one kennel
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub kennel_id: KennelId,
    pub is_approved: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Insert a membership. A second row for the same (user, kennel) is a `Conflict`.
    pub async fn create(
        user_id: UserId,
        kennel_id: KennelId,
        is_approved: bool,
        is_admin: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO memberships (id, user_id, kennel_id, is_approved, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(MembershipId::new())
        .bind(user_id)
        .bind(kennel_id)
        .bind(is_approved)
        .bind(is_admin)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("user {} is already a member of kennel {}", user_id, kennel_id))
    }

    pub async fn find_by_id(
        id: MembershipId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM memberships WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_user(
        user_id: UserId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM memberships WHERE user_id = $1 AND kennel_id = $2",
        )
        .bind(user_id)
        .bind(kennel_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Whether the user currently holds admin rights in the kennel.
    pub async fn is_admin(
        user_id: UserId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM memberships
                WHERE user_id = $1 AND kennel_id = $2 AND is_admin
            )
            "#,
        )
        .bind(user_id)
        .bind(kennel_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    pub async fn is_approved_member(
        user_id: UserId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM memberships
                WHERE user_id = $1 AND kennel_id = $2 AND (is_approved OR is_admin)
            )
            "#,
        )
        .bind(user_id)
        .bind(kennel_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    pub async fn set_admin(
        id: MembershipId,
        is_admin: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE memberships SET is_admin = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_admin)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn approve(id: MembershipId, conn: &mut PgConnection) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE memberships SET is_approved = true WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Delete the row. Consensus items targeting it cascade away with it.
    ///
    /// Callers that may be removing an admin must run the consensus recheck;
    /// see `kennels::activities::remove_membership`.
    pub async fn delete(id: MembershipId, conn: &mut PgConnection) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
