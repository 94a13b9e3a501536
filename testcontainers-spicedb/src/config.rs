use std::{sync::Arc, time::Duration};

use crate::{
    DEFAULT_GRPC_PORT, DEFAULT_IMAGE_NAME, DEFAULT_IMAGE_TAG, Error, OtelConfig,
    Result, SchemaWriter,
};

/// Pre-shared key used when none is configured.
pub const DEFAULT_SECRET_KEY: &str = "somepresharedkey";
/// How long [`crate::SpiceDbContainer::start()`] waits for spicedb to be ready.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for a [`crate::SpiceDbContainer`]. Everything has a default.
///
/// ```
/// use testcontainers_spicedb::SpiceDbConfig;
///
/// let cfg = SpiceDbConfig::builder()
///     .secret_key("mycustomsecret")
///     .schema("definition user {}")
///     .build();
/// assert_eq!(cfg.schema_secret_key(), "mycustomsecret");
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct SpiceDbConfig {
    #[builder(into, default = DEFAULT_IMAGE_NAME.to_owned())]
    image_name: String,
    #[builder(into, default = DEFAULT_IMAGE_TAG.to_owned())]
    image_tag: String,
    /// Container port of the gRPC api.
    #[builder(default = DEFAULT_GRPC_PORT)]
    port: u16,
    /// The gRPC pre-shared key spicedb is started with.
    #[builder(into, default = DEFAULT_SECRET_KEY.to_owned())]
    secret_key: String,
    /// Schema written once the container is ready.
    #[builder(into)]
    schema: Option<String>,
    /// Credential used to write [`Self::schema`]. Falls back to the secret key.
    #[builder(into)]
    schema_secret_key: Option<String>,
    /// Replaces the built-in gRPC schema writer.
    schema_writer: Option<Arc<dyn SchemaWriter>>,
    #[builder(default = DEFAULT_STARTUP_TIMEOUT)]
    startup_timeout: Duration,
    /// Enables spicedb's HTTP gateway on this container port.
    http_port: Option<u16>,
    otel: Option<OtelConfig>,
}

impl Default for SpiceDbConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SpiceDbConfig {
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn image_tag(&self) -> &str {
        &self.image_tag
    }

    /// `name:tag` of the image.
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_name, self.image_tag)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn schema_secret_key(&self) -> &str {
        self.schema_secret_key.as_deref().unwrap_or(&self.secret_key)
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    pub fn http_port(&self) -> Option<u16> {
        self.http_port
    }

    pub fn otel(&self) -> Option<&OtelConfig> {
        self.otel.as_ref()
    }

    /// The writer that will load the schema: the custom one if set, otherwise
    /// the built-in one if the `grpc` feature is enabled.
    pub fn resolve_schema_writer(&self) -> Option<Arc<dyn SchemaWriter>> {
        if let Some(writer) = &self.schema_writer {
            return Some(Arc::clone(writer));
        }

        #[cfg(feature = "grpc")]
        return Some(Arc::new(crate::GrpcSchemaWriter));

        #[cfg(not(feature = "grpc"))]
        None
    }

    /// Checks that the options are coherent, without touching docker.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::Configuration(msg.to_owned()));

        if self.image_name.is_empty() || self.image_tag.is_empty() {
            return invalid("image name and tag must not be empty");
        }
        if self.secret_key.is_empty() {
            return invalid("secret key must not be empty");
        }
        if self.port == 0 {
            return invalid("grpc port must not be 0");
        }
        match self.http_port {
            Some(0) => return invalid("http port must not be 0"),
            Some(p) if p == self.port => {
                return invalid("http port must differ from the grpc port");
            }
            _ => (),
        }
        if self.startup_timeout.is_zero() {
            return invalid("startup timeout must not be zero");
        }

        let Some(schema) = &self.schema else {
            return Ok(());
        };
        if schema.trim().is_empty() {
            return invalid("schema must not be blank");
        }
        if self.schema_secret_key().is_empty() {
            return invalid("schema secret key must not be empty");
        }
        if self.resolve_schema_writer().is_none() {
            return invalid(
                "a schema was given but there is no schema writer; set one or \
                enable the `grpc` feature",
            );
        }

        Ok(())
    }
}
