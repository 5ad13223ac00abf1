use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use typed_builder::TypedBuilder;

use crate::common::{DomainError, DomainResult, KennelId, UniqueViolationExt};

use super::membership::Membership;

/// Kennel model - a club members join and events are hosted by
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Kennel {
    pub id: KennelId,
    pub name: String,
    pub acronym: String,
    pub city: Option<String>,
    pub is_active: bool,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a kennel
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct CreateKennel {
    pub name: String,
    pub acronym: String,
    #[builder(default)]
    pub city: Option<String>,
    #[builder(default)]
    pub about: Option<String>,
}

impl Kennel {
    pub async fn create(input: &CreateKennel, conn: &mut PgConnection) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO kennels (id, name, acronym, city, about)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(KennelId::new())
        .bind(&input.name)
        .bind(&input.acronym)
        .bind(&input.city)
        .bind(&input.about)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("kennel '{}' already exists", input.name))
    }

    /// Lock the kennel row for the rest of the transaction.
    ///
    /// Every consensus mutation and every admin-pool change takes this lock
    /// first, so tallies, executor re-checks and cascades of one kennel never
    /// interleave. `NO KEY UPDATE` leaves plain FK inserts (new memberships,
    /// events) unblocked.
    pub async fn lock(id: KennelId, conn: &mut PgConnection) -> DomainResult<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM kennels WHERE id = $1 FOR NO KEY UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("kennel {}", id)))
    }

    /// Current admin memberships of the kennel.
    pub async fn admins(id: KennelId, conn: &mut PgConnection) -> DomainResult<Vec<Membership>> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE kennel_id = $1 AND is_admin ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn admin_count(id: KennelId, conn: &mut PgConnection) -> DomainResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM memberships WHERE kennel_id = $1 AND is_admin",
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }
}
