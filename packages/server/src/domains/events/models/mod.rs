pub mod attend;
pub mod attend_claim;
pub mod event;
pub mod longevity;
pub mod longevity_record;

pub use attend::{Attend, Attendee};
pub use attend_claim::AttendClaim;
pub use event::Event;
pub use longevity::Longevity;
pub use longevity_record::{KennelCounts, LongevityRecord, RecordedTally};
