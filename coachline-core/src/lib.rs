pub mod artifact;
pub mod identifier;
pub mod mailer;
pub mod models;
pub mod render;
pub mod repository;
pub mod status;
pub mod upstream;

/// Error taxonomy shared by every crate in the workspace.
///
/// `CacheIntegrity` is special: it is logged and treated as a cache miss by
/// callers, never surfaced as a request failure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upstream rejected the call ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stored artifact failed integrity check: {0}")]
    CacheIntegrity(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Internal service error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
