use serde::Serialize;
use tracing::info;

use crate::common::{DomainError, DomainResult, UserId};
use crate::domains::kennels::models::{CreateKennel, Kennel, Membership, User};
use crate::kernel::ServerDeps;

/// A new kennel and its founding admin
#[derive(Debug, Clone, Serialize)]
pub struct FoundedKennel {
    pub kennel: Kennel,
    pub membership: Membership,
}

/// Create a kennel with `founder` as its first, approved admin.
pub async fn create_kennel(
    founder: UserId,
    input: CreateKennel,
    deps: &ServerDeps,
) -> DomainResult<FoundedKennel> {
    if input.name.trim().is_empty() || input.acronym.trim().is_empty() {
        return Err(DomainError::validation("kennel name and acronym are required"));
    }

    let mut tx = deps.db_pool.begin().await?;

    User::find_by_id(founder, &mut *tx)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {}", founder)))?;

    let kennel = Kennel::create(&input, &mut *tx).await?;
    let membership = Membership::create(founder, kennel.id, true, true, &mut *tx).await?;
    tx.commit().await?;

    info!(kennel_id = %kennel.id, name = %kennel.name, %founder, "kennel created");
    Ok(FoundedKennel { kennel, membership })
}

/// Register a user by display name.
pub async fn register_user(username: &str, deps: &ServerDeps) -> DomainResult<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username is required"));
    }

    let mut conn = deps.db_pool.acquire().await?;
    let user = User::create(username, &mut *conn).await?;
    info!(user_id = %user.id, %username, "user registered");

    Ok(user)
}
