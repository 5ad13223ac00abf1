use thiserror::Error;

/// Caller-visible failures of kennel, event and consensus operations.
///
/// Executor re-check failures are not errors: they surface as
/// `ActionEffect::Skipped` on a resolved outcome.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Turns a unique-constraint violation (SQLSTATE 23505) into `Conflict`.
///
/// Model inserts race with each other even after an explicit existence
/// check, so the database constraint is the final word.
pub trait UniqueViolationExt<T> {
    fn or_conflict<F>(self, message: F) -> DomainResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> UniqueViolationExt<T> for Result<T, sqlx::Error> {
    fn or_conflict<F>(self, message: F) -> DomainResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::Conflict(message())
            }
            _ => DomainError::Database(err),
        })
    }
}
