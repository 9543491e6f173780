//! Error taxonomy: validation stops at the boundary where it is detected,
//! store and auth failures are surfaced to the caller with the backend text.

/// Validation failures caught synchronously, before any store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("end date must not be before the start date")]
    EndBeforeStart,
    #[error("completion date must not be after the end date")]
    CompletedAfterEnd,
    #[error("sub-project dates must lie within the parent project's range")]
    OutsideParentRange,
}

/// Failures reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// Failures reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    EmailInUse(String),
    #[error("auth error: {0}")]
    Backend(String),
}

/// Any error a dashboard operation can surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
