//! Server dependencies shared by every activity

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::common::auth::HasAuthContext;
use crate::common::{DomainResult, KennelId, UserId};
use crate::config::Config;
use crate::domains::consensus::policy::VotingPolicy;
use crate::domains::kennels::models::Membership;

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Majority rule for consensus ballots
    pub voting: VotingPolicy,
}

impl ServerDeps {
    pub fn new(db_pool: PgPool, voting: VotingPolicy) -> Self {
        Self { db_pool, voting }
    }

    /// Open the connection pool described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        let voting = config.voting_policy()?;
        info!(
            max_connections = config.database_max_connections,
            majority = voting.majority(),
            "database pool ready"
        );

        Ok(Self::new(db_pool, voting))
    }
}

#[async_trait]
impl HasAuthContext for ServerDeps {
    async fn is_kennel_admin(&self, user: UserId, kennel: KennelId) -> DomainResult<bool> {
        let mut conn = self.db_pool.acquire().await?;
        Membership::is_admin(user, kennel, &mut *conn).await
    }

    async fn is_approved_member(&self, user: UserId, kennel: KennelId) -> DomainResult<bool> {
        let mut conn = self.db_pool.acquire().await?;
        Membership::is_approved_member(user, kennel, &mut *conn).await
    }
}
