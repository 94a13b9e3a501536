use std::time::Duration;

use testcontainers::TestcontainersError;

/// Type-erased error returned by a [`crate::SchemaWriter`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The options can't produce a working container. Detected before anything
    /// is created.
    #[error("invalid spicedb configuration: {0}")]
    Configuration(String),
    #[error("spicedb did not become ready within {0:?}")]
    StartupTimeout(Duration),
    /// Writing the schema failed. The container has already been removed.
    #[error("failed to load schema into spicedb")]
    SchemaLoad(#[source] BoxError),
    #[error("spicedb container is not running")]
    NotStarted,
    #[error("container runtime error")]
    Container(#[from] TestcontainersError),
}
