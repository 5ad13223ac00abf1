pub mod kennel;
pub mod legacy_longevity;
pub mod membership;
pub mod user;

pub use kennel::{CreateKennel, Kennel};
pub use legacy_longevity::LegacyLongevity;
pub use membership::Membership;
pub use user::User;
