use serde::Serialize;

use super::models::ConsensusAction;
use super::policy::VoteSplit;
use crate::common::ConsensusId;

/// Result of evaluating a consensus. Everything but `Pending` means the row
/// and its ballots are gone, so this value is the only record of the outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    Pending { split: VoteSplit },
    Resolved { effect: ActionEffect },
    Rejected { split: VoteSplit },
    Voided { reason: VoidReason },
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_voided(&self) -> bool {
        matches!(self, Self::Voided { .. })
    }
}

/// What an executor did with a carried consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ActionEffect {
    Applied,
    Skipped { reason: SkipReason },
}

/// Why a carried consensus had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    LastAdmin,
    NotAdmin,
    AlreadyCredited,
    NotCredited,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::LastAdmin => "cannot remove the last admin",
            Self::NotAdmin => "target is not an admin",
            Self::AlreadyCredited => "event already counts toward the kennel",
            Self::NotCredited => "event does not count toward the kennel",
        };
        f.write_str(text)
    }
}

/// Why a consensus was deleted without executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidReason {
    InitiatorDemoted,
    Withdrawn,
    EmptyPool,
}

/// An outcome tagged with the item it belongs to, for cascade reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusOutcome {
    pub consensus_id: ConsensusId,
    pub action: ConsensusAction,
    pub outcome: Outcome,
}
