pub mod activities;
pub mod models;

pub use models::{Attend, AttendClaim, Attendee, Event, Longevity, LongevityRecord};
