use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Opportunity not found: {0}")]
    OpportunityNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Interest not found: {0}")]
    InterestNotFound(String),

    #[error("Opportunity {1} already saved by user {0}")]
    OpportunityAlreadySaved(String, String),

    #[error("Interest already expressed by user {0} in opportunity {1}")]
    InterestAlreadyExists(String, String),

    #[error("Schema mismatch in {0}: {1}")]
    SchemaMismatch(String, String),

    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Carries the identity provider's message verbatim
    #[error("{0}")]
    Authentication(String),

    #[error("You must be logged in to {0}")]
    NotAuthenticated(String),

    #[error("Session resolution {0} was superseded")]
    StaleResolution(u64),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Snapshot store error: {0}")]
    SnapshotError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
