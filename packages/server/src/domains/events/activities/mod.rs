//! Events and the longevity ledger

mod attendance;
mod events;
mod longevity;

pub use attendance::{
    assign_attendee, claim_attendance, claims_for_event, delete_attendance, set_attendance_hare,
    withdraw_claim,
};
pub use events::{create_event, record_attendance, HostedEvent, RecordedAttendance};
pub use longevity::{
    longevity_summary, longevity_tally, set_record_counted, KennelLongevity, LongevityTally,
};
