use std::sync::Arc;

/// Represents a result type for operations in the Rox SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller.
///
/// Flag evaluation never returns an error: malformed expressions and misconfigured experiments
/// degrade to default values. Errors are reserved for programming mistakes detected during
/// initialization and for configuration payloads that cannot be read at all.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A container with the same namespace has already been registered.
    #[error("namespace {0:?} is already registered")]
    DuplicateNamespace(String),

    /// Configuration payload is not valid JSON or has unexpected top-level shape.
    #[error("invalid configuration payload")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    InvalidConfiguration(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidConfiguration(Arc::new(value))
    }
}
