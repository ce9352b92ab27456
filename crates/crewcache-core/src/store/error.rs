use thiserror::Error;

use crate::api::ApiError;

/// Failure taxonomy for store actions. Every store method returns one of
/// these instead of panicking, and a backend failure never disturbs the
/// local mirrors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Login failed. Deliberately does not reveal whether the email exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The caller's role does not allow the operation.
    #[error("{0}")]
    Denied(String),

    /// The request itself is malformed (weak password, duplicate email).
    #[error("{0}")]
    Validation(String),

    /// The referenced row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The backend call failed; local state is unchanged.
    #[error(transparent)]
    Backend(#[from] ApiError),

    /// A local operation that should not fail did (hashing, serialization).
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
