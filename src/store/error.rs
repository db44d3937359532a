use thiserror::Error;

/// Domain errors surfaced by the store and the workflows built on it.
/// Display strings double as the client-facing error messages.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified. Please check your inbox.")]
    EmailNotVerified,

    #[error("{0}")]
    Validation(String),

    #[error("store io: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Io(format!("invalid store document: {err}"))
    }
}
