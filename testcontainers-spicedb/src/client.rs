//! Minimal gRPC client for the spicedb apis needed to set up test fixtures.
//!
//! This is not a general purpose spicedb client. It covers writing and reading
//! the schema, and writing relationships.

mod proto;

use std::time::Duration;

use tonic::{
    Request,
    codec::ProstCodec,
    codegen::http::uri::PathAndQuery,
    metadata::{AsciiMetadataValue, errors::InvalidMetadataValue},
    transport::{Channel, Endpoint},
};
use tracing::debug;

pub use self::proto::*;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Deadline for each rpc, so a stalled spicedb can't hang a test.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const WRITE_SCHEMA: &str = "/authzed.api.v1.SchemaService/WriteSchema";
const READ_SCHEMA: &str = "/authzed.api.v1.SchemaService/ReadSchema";
const WRITE_RELATIONSHIPS: &str =
    "/authzed.api.v1.PermissionsService/WriteRelationships";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid spicedb endpoint {endpoint:?}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("failed to connect to spicedb")]
    Connect(#[source] tonic::transport::Error),
    #[error("credential is not a valid bearer token")]
    InvalidCredential(#[from] InvalidMetadataValue),
    #[error("spicedb returned an error: {0}")]
    Status(#[from] tonic::Status),
}

/// Talks to spicedb's `SchemaService` and `PermissionsService` over plaintext
/// gRPC, authenticating with a pre-shared key.
#[derive(Debug, Clone)]
pub struct SchemaClient {
    grpc: tonic::client::Grpc<Channel>,
    authorization: AsciiMetadataValue,
}

impl SchemaClient {
    /// `endpoint` is either `host:port` or a full `http://host:port` uri.
    pub async fn connect(
        endpoint: &str,
        credential: &str,
    ) -> Result<Self, ClientError> {
        Self::connect_with_timeout(endpoint, credential, REQUEST_TIMEOUT).await
    }

    /// Like [`Self::connect()`], but each rpc fails after `request_timeout`.
    pub async fn connect_with_timeout(
        endpoint: &str,
        credential: &str,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let authorization: AsciiMetadataValue =
            format!("Bearer {credential}").parse()?;

        let uri = if endpoint.contains("://") {
            endpoint.to_owned()
        } else {
            format!("http://{endpoint}")
        };
        let channel = Endpoint::from_shared(uri)
            .map_err(|source| ClientError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                source,
            })?
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .connect()
            .await
            .map_err(ClientError::Connect)?;
        debug!(endpoint, "connected to spicedb");

        Ok(Self {
            grpc: tonic::client::Grpc::new(channel),
            authorization,
        })
    }

    pub async fn write_schema(
        &mut self,
        schema: impl Into<String>,
    ) -> Result<WriteSchemaResponse, ClientError> {
        let request = WriteSchemaRequest {
            schema: schema.into(),
        };

        self.unary(WRITE_SCHEMA, request).await
    }

    /// Returns the schema text currently stored in spicedb.
    pub async fn read_schema(&mut self) -> Result<String, ClientError> {
        let response: ReadSchemaResponse =
            self.unary(READ_SCHEMA, ReadSchemaRequest {}).await?;

        Ok(response.schema_text)
    }

    pub async fn write_relationships(
        &mut self,
        updates: impl IntoIterator<Item = RelationshipUpdate>,
    ) -> Result<WriteRelationshipsResponse, ClientError> {
        let request = WriteRelationshipsRequest {
            updates: updates.into_iter().collect(),
        };

        self.unary(WRITE_RELATIONSHIPS, request).await
    }

    async fn unary<Req, Resp>(
        &mut self,
        path: &'static str,
        message: Req,
    ) -> Result<Resp, ClientError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.grpc.ready().await.map_err(|err| {
            tonic::Status::unknown(format!("service was not ready: {err}"))
        })?;

        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert("authorization", self.authorization.clone());

        let response = self
            .grpc
            .unary(request, PathAndQuery::from_static(path), ProstCodec::default())
            .await?;

        Ok(response.into_inner())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_invalid_credential_is_rejected_before_connecting() {
        let err = SchemaClient::connect("127.0.0.1:1", "new\nline")
            .await
            .expect_err("newlines are not valid in headers");

        assert!(matches!(err, ClientError::InvalidCredential(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_to_connect() {
        let err = SchemaClient::connect("127.0.0.1:1", "somepresharedkey")
            .await
            .expect_err("nothing listens on port 1");

        assert!(matches!(err, ClientError::Connect(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_stalled_server_hits_request_timeout() {
        // Accepts connections but never speaks http2.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        // longer than CONNECT_TIMEOUT, whichever of the two deadlines fires
        let result = tokio::time::timeout(Duration::from_secs(15), async {
            let mut client = SchemaClient::connect_with_timeout(
                &addr.to_string(),
                "somepresharedkey",
                Duration::from_millis(200),
            )
            .await?;
            client.write_schema("definition user {}").await
        })
        .await
        .expect("request timeout should fire before the test deadline");

        assert!(result.is_err(), "{result:?}");
    }

    #[tokio::test]
    async fn test_malformed_endpoint() {
        let err = SchemaClient::connect("not a uri", "somepresharedkey")
            .await
            .expect_err("spaces are not valid in a uri");

        assert!(
            matches!(err, ClientError::InvalidEndpoint { .. }),
            "{err:?}"
        );
    }
}
