mod create_kennel;
mod legacy;
mod membership;

pub use create_kennel::{create_kennel, register_user, FoundedKennel};
pub use legacy::set_legacy_longevity;
pub use membership::{
    add_membership, approve_membership, leave_kennel, remove_membership, request_membership,
};
