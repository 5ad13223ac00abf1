// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;

pub use auth::{Actor, HasAuthContext, KennelCapability};
pub use entity_ids::*;
pub use error::{DomainError, DomainResult, UniqueViolationExt};
pub use id::Id;
