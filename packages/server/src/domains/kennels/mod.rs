pub mod activities;
pub mod models;

pub use models::{CreateKennel, Kennel, LegacyLongevity, Membership, User};
