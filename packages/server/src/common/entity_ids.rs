//! Typed ID definitions for all kennel entities.
//!
//! ```rust
//! use packtrack_core::common::{KennelId, MembershipId};
//!
//! let kennel_id = KennelId::new();
//! let membership_id = MembershipId::new();
//! assert_ne!(kennel_id.into_uuid(), membership_id.into_uuid());
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for users (identity owned by the auth provider).
pub struct User;

/// Marker type for kennels (clubs).
pub struct Kennel;

/// Marker type for a user's membership in a kennel.
pub struct Membership;

/// Marker type for events hosted by a kennel.
pub struct Event;

/// Marker type for an attendance record at an event.
pub struct Attend;

/// Marker type for a user's claim on an unclaimed attendance.
pub struct AttendClaim;

/// Marker type for an event-to-kennel longevity credit.
pub struct Longevity;

/// Marker type for a per-attendance longevity record.
pub struct LongevityRecord;

/// Marker type for manually entered historical attendance.
pub struct LegacyLongevity;

/// Marker type for an open admin vote.
pub struct Consensus;

/// Marker type for one admin's ballot on a consensus.
pub struct ConsensusVote;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type KennelId = Id<Kennel>;
pub type MembershipId = Id<Membership>;
pub type EventId = Id<Event>;
pub type AttendId = Id<Attend>;
pub type AttendClaimId = Id<AttendClaim>;
pub type LongevityId = Id<Longevity>;
pub type LongevityRecordId = Id<LongevityRecord>;
pub type LegacyLongevityId = Id<LegacyLongevity>;
pub type ConsensusId = Id<Consensus>;
pub type ConsensusVoteId = Id<ConsensusVote>;
