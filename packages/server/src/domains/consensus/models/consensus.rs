use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{
    ConsensusId, DomainError, DomainResult, EventId, KennelId, MembershipId, UniqueViolationExt,
    UserId,
};

/// What a consensus decides on. Stored as the Postgres enum `consensus_action`;
/// declaration order is the listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "consensus_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConsensusAction {
    Kick,
    GrantAdmin,
    RevokeAdmin,
    AddLongevity,
    RemoveLongevity,
}

/// The kind of row an action operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Membership,
    Event,
}

/// The row a consensus operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ConsensusTarget {
    Membership(MembershipId),
    Event(EventId),
}

impl ConsensusAction {
    pub const ALL: [ConsensusAction; 5] = [
        Self::Kick,
        Self::GrantAdmin,
        Self::RevokeAdmin,
        Self::AddLongevity,
        Self::RemoveLongevity,
    ];

    pub fn target_kind(&self) -> TargetKind {
        match self {
            Self::Kick | Self::GrantAdmin | Self::RevokeAdmin => TargetKind::Membership,
            Self::AddLongevity | Self::RemoveLongevity => TargetKind::Event,
        }
    }

    /// The single type/target compatibility rule.
    pub fn validate_target(&self, target: &ConsensusTarget) -> DomainResult<()> {
        let actual = match target {
            ConsensusTarget::Membership(_) => TargetKind::Membership,
            ConsensusTarget::Event(_) => TargetKind::Event,
        };
        if actual != self.target_kind() {
            return Err(DomainError::validation(format!(
                "{} targets a {:?}, got a {:?}",
                self,
                self.target_kind(),
                actual
            )));
        }
        Ok(())
    }

    /// Label used in human-readable descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kick => "Kick",
            Self::GrantAdmin => "Make Admin",
            Self::RevokeAdmin => "Revoke Admin",
            Self::AddLongevity => "Add Longevity",
            Self::RemoveLongevity => "Remove Longevity",
        }
    }
}

impl std::fmt::Display for ConsensusAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kick => write!(f, "kick"),
            Self::GrantAdmin => write!(f, "grant_admin"),
            Self::RevokeAdmin => write!(f, "revoke_admin"),
            Self::AddLongevity => write!(f, "add_longevity"),
            Self::RemoveLongevity => write!(f, "remove_longevity"),
        }
    }
}

impl std::str::FromStr for ConsensusAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.to_string() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid consensus action: {}", s)))
    }
}

/// Consensus model - an open admin vote. Rows only exist while OPEN;
/// resolution of any kind deletes the row and its ballots.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Consensus {
    pub id: ConsensusId,
    pub initiator_id: UserId,
    pub kennel_id: KennelId,
    pub action: ConsensusAction,
    pub membership_id: Option<MembershipId>,
    pub event_id: Option<EventId>,
    pub created_at: DateTime<Utc>,
}

/// A consensus joined with what its description needs.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConsensusView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub consensus: Consensus,
    pub kennel_name: String,
    pub target_username: Option<String>,
    pub event_name: Option<String>,
    pub event_host_name: Option<String>,
}

const VIEW_SELECT: &str = r#"
    SELECT c.*,
           k.name AS kennel_name,
           u.username AS target_username,
           e.name AS event_name,
           hk.name AS event_host_name
    FROM consensuses c
    JOIN kennels k ON k.id = c.kennel_id
    LEFT JOIN memberships m ON m.id = c.membership_id
    LEFT JOIN users u ON u.id = m.user_id
    LEFT JOIN events e ON e.id = c.event_id
    LEFT JOIN kennels hk ON hk.id = e.host_id
"#;

impl ConsensusView {
    /// "Kick: alice", "Add Longevity: Full Moon Run - Acme", ...
    pub fn describe(&self) -> String {
        let subject = match self.consensus.action.target_kind() {
            TargetKind::Membership => self
                .target_username
                .clone()
                .unwrap_or_else(|| "(unknown member)".to_string()),
            TargetKind::Event => match (&self.event_name, &self.event_host_name) {
                (Some(name), Some(host)) => format!("{} - {}", name, host),
                (Some(name), None) => name.clone(),
                _ => "(unknown event)".to_string(),
            },
        };
        format!("{}: {}", self.consensus.action.label(), subject)
    }
}

impl Consensus {
    pub async fn create(
        initiator_id: UserId,
        kennel_id: KennelId,
        action: ConsensusAction,
        target: ConsensusTarget,
        conn: &mut PgConnection,
    ) -> DomainResult<Self> {
        let (membership_id, event_id) = split_target(target);

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO consensuses (id, initiator_id, kennel_id, action, membership_id, event_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(ConsensusId::new())
        .bind(initiator_id)
        .bind(kennel_id)
        .bind(action)
        .bind(membership_id)
        .bind(event_id)
        .fetch_one(conn)
        .await
        .or_conflict(|| format!("an open consensus already targets {:?}", target))
    }

    pub async fn find_by_id(
        id: ConsensusId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM consensuses WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// The open consensus of a kennel for a target, if any.
    pub async fn find_open_for_target(
        kennel_id: KennelId,
        target: ConsensusTarget,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<Self>> {
        let (membership_id, event_id) = split_target(target);

        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM consensuses
            WHERE kennel_id = $1
              AND (membership_id = $2 OR event_id = $3)
            "#,
        )
        .bind(kennel_id)
        .bind(membership_id)
        .bind(event_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Open items of a kennel in creation order.
    pub async fn find_by_kennel(
        kennel_id: KennelId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM consensuses WHERE kennel_id = $1 ORDER BY created_at, id",
        )
        .bind(kennel_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: ConsensusId, conn: &mut PgConnection) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM consensuses WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_view(
        id: ConsensusId,
        conn: &mut PgConnection,
    ) -> DomainResult<Option<ConsensusView>> {
        sqlx::query_as::<_, ConsensusView>(&format!("{} WHERE c.id = $1", VIEW_SELECT))
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// Open items in every kennel where the user is an admin.
    pub async fn find_views_for_admin(
        user_id: UserId,
        conn: &mut PgConnection,
    ) -> DomainResult<Vec<ConsensusView>> {
        sqlx::query_as::<_, ConsensusView>(&format!(
            r#"{}
            WHERE c.kennel_id IN (
                SELECT kennel_id FROM memberships WHERE user_id = $1 AND is_admin
            )
            ORDER BY k.name, c.action, c.created_at
            "#,
            VIEW_SELECT
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }
}

fn split_target(target: ConsensusTarget) -> (Option<MembershipId>, Option<EventId>) {
    match target {
        ConsensusTarget::Membership(id) => (Some(id), None),
        ConsensusTarget::Event(id) => (None, Some(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(action: ConsensusAction, target: ConsensusTarget) -> ConsensusView {
        let (membership_id, event_id) = split_target(target);
        ConsensusView {
            consensus: Consensus {
                id: ConsensusId::new(),
                initiator_id: UserId::new(),
                kennel_id: KennelId::new(),
                action,
                membership_id,
                event_id,
                created_at: Utc::now(),
            },
            kennel_name: "Acme".to_string(),
            target_username: Some("mallory".to_string()),
            event_name: Some("Full Moon Run".to_string()),
            event_host_name: Some("Acme".to_string()),
        }
    }

    #[test]
    fn test_member_actions_reject_event_targets() {
        let event = ConsensusTarget::Event(EventId::new());
        for action in [
            ConsensusAction::Kick,
            ConsensusAction::GrantAdmin,
            ConsensusAction::RevokeAdmin,
        ] {
            assert!(action.validate_target(&event).unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_longevity_actions_require_event_targets() {
        let membership = ConsensusTarget::Membership(MembershipId::new());
        let event = ConsensusTarget::Event(EventId::new());
        for action in [ConsensusAction::AddLongevity, ConsensusAction::RemoveLongevity] {
            assert!(action.validate_target(&membership).is_err());
            assert!(action.validate_target(&event).is_ok());
        }
    }

    #[test]
    fn test_action_string_roundtrip() {
        for action in ConsensusAction::ALL {
            assert_eq!(action.to_string().parse::<ConsensusAction>().unwrap(), action);
        }
        assert!("delete_club".parse::<ConsensusAction>().is_err());
    }

    #[test]
    fn test_describe() {
        let kick = view(
            ConsensusAction::Kick,
            ConsensusTarget::Membership(MembershipId::new()),
        );
        assert_eq!(kick.describe(), "Kick: mallory");

        let add = view(
            ConsensusAction::AddLongevity,
            ConsensusTarget::Event(EventId::new()),
        );
        assert_eq!(add.describe(), "Add Longevity: Full Moon Run - Acme");
    }
}
