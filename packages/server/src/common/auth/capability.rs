use crate::common::KennelId;

/// Kennel-scoped capabilities checked before non-consensus operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KennelCapability {
    /// Approve pending membership requests
    ManageMembers(KennelId),

    /// Create events hosted by the kennel and record attendance at them
    ManageEvents(KennelId),

    /// Edit legacy longevity and toggle which records count
    ManageLongevity(KennelId),

    /// Read open consensus items and their vote splits
    ViewConsensus(KennelId),

    /// Read a member's longevity tally
    ViewLongevity(KennelId),
}

impl KennelCapability {
    pub fn kennel(&self) -> KennelId {
        match *self {
            Self::ManageMembers(k)
            | Self::ManageEvents(k)
            | Self::ManageLongevity(k)
            | Self::ViewConsensus(k)
            | Self::ViewLongevity(k) => k,
        }
    }

    /// Whether admin rights are needed; otherwise an approved membership suffices.
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Self::ViewLongevity(_))
    }
}
