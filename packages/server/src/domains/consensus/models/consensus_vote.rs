use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{ConsensusId, ConsensusVoteId, DomainResult, KennelId, UserId};

use super::consensus::ConsensusAction;
use crate::domains::consensus::policy::Tally;

/// One admin's ballot on a consensus. `vote` is NULL until cast.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConsensusVote {
    pub id: ConsensusVoteId,
    pub consensus_id: ConsensusId,
    pub voter_id: UserId,
    pub vote: Option<bool>,
}

/// A ballot listed for its voter, with the consensus it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Ballot {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ballot: ConsensusVote,
    pub kennel_id: KennelId,
    pub kennel_name: String,
    pub action: ConsensusAction,
}

impl ConsensusVote {
    /// Seed an empty ballot for every current admin of the kennel.
    ///
    /// The admin pool is frozen here; admins granted later get no ballot.
    pub async fn seed_for_admins(
        consensus_id: ConsensusId,
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO consensus_votes (id, consensus_id, voter_id)
            SELECT gen_random_uuid(), $1, m.user_id
            FROM memberships m
            WHERE m.kennel_id = $2 AND m.is_admin
            "#,
        )
        .bind(consensus_id)
        .bind(kennel_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_consensus(
        consensus_id: ConsensusId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM consensus_votes WHERE consensus_id = $1 ORDER BY id",
        )
        .bind(consensus_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Set the vote on an existing ballot. `None` if the voter has no ballot.
    pub async fn record(
        consensus_id: ConsensusId,
        voter_id: UserId,
        vote: bool,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE consensus_votes SET vote = $3
            WHERE consensus_id = $1 AND voter_id = $2
            RETURNING *
            "#,
        )
        .bind(consensus_id)
        .bind(voter_id)
        .bind(vote)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(
        consensus_id: ConsensusId,
        voter_id: UserId,
        conn: &mut PgConnection,
    ) -> DomainResult<bool> {
        let result =
            sqlx::query("DELETE FROM consensus_votes WHERE consensus_id = $1 AND voter_id = $2")
                .bind(consensus_id)
                .bind(voter_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count the ballot pool and the votes cast each way.
    pub async fn tally(consensus_id: ConsensusId, conn: &mut PgConnection) -> DomainResult<Tally> {
        sqlx::query_as::<_, Tally>(
            r#"
            SELECT
                COUNT(*) AS pool_size,
                COUNT(*) FILTER (WHERE vote) AS yes,
                COUNT(*) FILTER (WHERE NOT vote) AS no
            FROM consensus_votes
            WHERE consensus_id = $1
            "#,
        )
        .bind(consensus_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// A user's ballots across kennels, grouped by kennel then action.
    pub async fn find_by_voter(voter_id: UserId, conn: &mut PgConnection) -> DomainResult<Vec<Ballot>> {
        sqlx::query_as::<_, Ballot>(
            r#"
            SELECT v.*, c.kennel_id, k.name AS kennel_name, c.action
            FROM consensus_votes v
            JOIN consensuses c ON c.id = v.consensus_id
            JOIN kennels k ON k.id = c.kennel_id
            WHERE v.voter_id = $1
            ORDER BY k.name, c.action, c.created_at
            "#,
        )
        .bind(voter_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }
}
