use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;

use crate::BoxError;

/// Loads a schema into a running spicedb.
///
/// The default is [`GrpcSchemaWriter`]. Implement this, or use
/// [`schema_writer_fn()`], to load the schema some other way.
#[async_trait]
pub trait SchemaWriter: fmt::Debug + Send + Sync {
    /// `endpoint` is the `host:port` of the gRPC api.
    async fn write_schema(
        &self,
        endpoint: &str,
        credential: &str,
        schema: &str,
    ) -> Result<(), BoxError>;
}

/// Wraps an async closure as a [`SchemaWriter`]. It is called with
/// `(endpoint, credential, schema)`.
pub fn schema_writer_fn<F, Fut>(f: F) -> Arc<dyn SchemaWriter>
where
    F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(FnSchemaWriter(f))
}

struct FnSchemaWriter<F>(F);

impl<F> fmt::Debug for FnSchemaWriter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchemaWriter").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> SchemaWriter for FnSchemaWriter<F>
where
    F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn write_schema(
        &self,
        endpoint: &str,
        credential: &str,
        schema: &str,
    ) -> Result<(), BoxError> {
        (self.0)(endpoint.to_owned(), credential.to_owned(), schema.to_owned()).await
    }
}

/// Writes the schema with spicedb's `WriteSchema` rpc, authenticating with the
/// credential as a bearer token.
#[cfg(feature = "grpc")]
#[derive(Debug, Default, Clone, Copy)]
pub struct GrpcSchemaWriter;

#[cfg(feature = "grpc")]
#[async_trait]
impl SchemaWriter for GrpcSchemaWriter {
    async fn write_schema(
        &self,
        endpoint: &str,
        credential: &str,
        schema: &str,
    ) -> Result<(), BoxError> {
        let mut client =
            crate::client::SchemaClient::connect(endpoint, credential).await?;
        let response = client.write_schema(schema).await?;
        tracing::debug!(written_at = ?response.written_at, "wrote schema");

        Ok(())
    }
}
