use serde::Serialize;
use tracing::info;

use crate::common::auth::{Actor, KennelCapability};
use crate::common::{DomainError, DomainResult, KennelId, LongevityRecordId, UserId};
use crate::domains::events::models::{KennelCounts, LongevityRecord, RecordedTally};
use crate::domains::kennels::models::LegacyLongevity;
use crate::kernel::ServerDeps;

/// A member's runs and hares for one kennel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LongevityTally {
    pub user_id: UserId,
    pub kennel_id: KennelId,
    pub runs: i64,
    pub hares: i64,
    pub legacy_runs: i64,
    pub legacy_hares: i64,
}

impl LongevityTally {
    fn new(
        user_id: UserId,
        kennel_id: KennelId,
        recorded: RecordedTally,
        legacy: Option<&LegacyLongevity>,
    ) -> Self {
        let (legacy_runs, legacy_hares) = legacy
            .map(|l| (i64::from(l.count), i64::from(l.hares)))
            .unwrap_or_default();
        Self::with_legacy(user_id, kennel_id, recorded, legacy_runs, legacy_hares)
    }

    fn with_legacy(
        user_id: UserId,
        kennel_id: KennelId,
        recorded: RecordedTally,
        legacy_runs: i64,
        legacy_hares: i64,
    ) -> Self {
        Self {
            user_id,
            kennel_id,
            runs: recorded.runs + legacy_runs,
            hares: recorded.hares + legacy_hares,
            legacy_runs,
            legacy_hares,
        }
    }
}

/// One kennel's line in a member's cross-kennel summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KennelLongevity {
    pub kennel_name: String,
    #[serde(flatten)]
    pub tally: LongevityTally,
}

impl KennelLongevity {
    fn from_counts(user_id: UserId, counts: KennelCounts) -> Self {
        Self {
            tally: LongevityTally::with_legacy(
                user_id,
                counts.kennel_id,
                counts.recorded,
                counts.legacy_runs,
                counts.legacy_hares,
            ),
            kennel_name: counts.kennel_name,
        }
    }

    fn total(&self) -> i64 {
        self.tally.runs + self.tally.hares
    }
}

/// Toggle whether one attendance counts toward its kennel.
pub async fn set_record_counted(
    actor: UserId,
    record_id: LongevityRecordId,
    is_longevity: bool,
    deps: &ServerDeps,
) -> DomainResult<LongevityRecord> {
    let mut conn = deps.db_pool.acquire().await?;

    let kennel_id = LongevityRecord::kennel_of(record_id, &mut *conn)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("longevity record {}", record_id)))?;

    Actor::new(actor)
        .can(KennelCapability::ManageLongevity(kennel_id))
        .check(deps)
        .await?;

    let record = LongevityRecord::set_counted(record_id, is_longevity, &mut *conn).await?;
    info!(%record_id, %kennel_id, is_longevity, %actor, "longevity record updated");

    Ok(record)
}

/// Counted attendance plus legacy counts. Any approved member of the kennel
/// may look.
pub async fn longevity_tally(
    requester: UserId,
    user_id: UserId,
    kennel_id: KennelId,
    deps: &ServerDeps,
) -> DomainResult<LongevityTally> {
    Actor::new(requester)
        .can(KennelCapability::ViewLongevity(kennel_id))
        .check(deps)
        .await?;

    let mut conn = deps.db_pool.acquire().await?;
    let recorded = LongevityRecord::tally(user_id, kennel_id, &mut *conn).await?;
    let legacy = LegacyLongevity::find(user_id, kennel_id, &mut *conn).await?;

    Ok(LongevityTally::new(user_id, kennel_id, recorded, legacy.as_ref()))
}

/// A member's longevity in every kennel they have runs or a legacy count
/// in, biggest first.
///
/// Members see all of their own lines. Anyone else sees only kennels where
/// they are an approved member themselves.
pub async fn longevity_summary(
    requester: UserId,
    user_id: UserId,
    deps: &ServerDeps,
) -> DomainResult<Vec<KennelLongevity>> {
    let counts = {
        let mut conn = deps.db_pool.acquire().await?;
        LongevityRecord::summary(user_id, &mut *conn).await?
    };

    let mut lines = Vec::with_capacity(counts.len());
    for row in counts {
        if requester != user_id {
            let visible = Actor::new(requester)
                .can(KennelCapability::ViewLongevity(row.kennel_id))
                .check(deps)
                .await;
            match visible {
                Ok(()) => {}
                Err(err) if err.is_permission_denied() => continue,
                Err(err) => return Err(err),
            }
        }
        lines.push(KennelLongevity::from_counts(user_id, row));
    }

    sort_by_total(&mut lines);
    Ok(lines)
}

fn sort_by_total(lines: &mut [KennelLongevity]) {
    lines.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| a.kennel_name.cmp(&b.kennel_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_adds_legacy_counts() {
        let user_id = UserId::new();
        let kennel_id = KennelId::new();
        let legacy = LegacyLongevity {
            id: crate::common::LegacyLongevityId::new(),
            user_id,
            kennel_id,
            count: 40,
            hares: 3,
        };

        let tally = LongevityTally::new(
            user_id,
            kennel_id,
            RecordedTally { runs: 2, hares: 1 },
            Some(&legacy),
        );
        assert_eq!(tally.runs, 42);
        assert_eq!(tally.hares, 4);
        assert_eq!(tally.legacy_runs, 40);
    }

    #[test]
    fn test_tally_without_legacy() {
        let tally = LongevityTally::new(
            UserId::new(),
            KennelId::new(),
            RecordedTally { runs: 5, hares: 0 },
            None,
        );
        assert_eq!(tally.runs, 5);
        assert_eq!(tally.legacy_hares, 0);
    }

    fn line(name: &str, runs: i64, hares: i64, legacy_runs: i64) -> KennelLongevity {
        KennelLongevity::from_counts(
            UserId::new(),
            KennelCounts {
                kennel_id: KennelId::new(),
                kennel_name: name.to_string(),
                recorded: RecordedTally { runs, hares },
                legacy_runs,
                legacy_hares: 0,
            },
        )
    }

    #[test]
    fn test_summary_sorts_by_total_including_legacy() {
        let mut lines = vec![
            line("Alpha", 3, 1, 0),
            line("Bravo", 1, 0, 10),
            line("Charlie", 4, 0, 0),
        ];
        sort_by_total(&mut lines);

        let names: Vec<_> = lines.iter().map(|l| l.kennel_name.as_str()).collect();
        assert_eq!(names, vec!["Bravo", "Alpha", "Charlie"]);
        assert_eq!(lines[0].tally.runs, 11);
    }

    #[test]
    fn test_summary_ties_break_by_name() {
        let mut lines = vec![line("Zulu", 2, 0, 0), line("Echo", 1, 1, 0)];
        sort_by_total(&mut lines);
        assert_eq!(lines[0].kennel_name, "Echo");
    }
}
