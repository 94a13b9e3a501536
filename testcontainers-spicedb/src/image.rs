use std::borrow::Cow;

use testcontainers::{
    Image,
    core::{ContainerPort, WaitFor},
};

use crate::SpiceDbConfig;

pub const DEFAULT_IMAGE_NAME: &str = "authzed/spicedb";
pub const DEFAULT_IMAGE_TAG: &str = "v1.47.1";
/// Port spicedb serves its gRPC api on.
pub const DEFAULT_GRPC_PORT: u16 = 50051;
/// Logged by spicedb once the gRPC api accepts requests.
pub const READY_MESSAGE: &str = "grpc server started serving";

/// Where spicedb exports its traces to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtelConfig {
    /// One of spicedb's `--otel-provider` values, such as `otlpgrpc`.
    pub provider: String,
    pub endpoint: String,
}

/// The spicedb [`Image`], serving with an in-memory datastore.
///
/// Usually you want [`crate::SpiceDbContainer`], which also knows how to load a
/// schema and clean up after itself. This is exposed for people that want to
/// drive testcontainers directly.
#[derive(Debug, Clone)]
pub struct SpiceDb {
    name: String,
    tag: String,
    args: Vec<String>,
    ports: Vec<ContainerPort>,
}

impl SpiceDb {
    pub fn new(config: &SpiceDbConfig) -> Self {
        let mut args = vec![
            "serve".to_owned(),
            "--grpc-preshared-key".to_owned(),
            config.secret_key().to_owned(),
            "--grpc-addr".to_owned(),
            format!(":{}", config.port()),
        ];
        let mut ports = vec![ContainerPort::Tcp(config.port())];

        if let Some(http_port) = config.http_port() {
            args.extend([
                "--http-enabled".to_owned(),
                "--http-addr".to_owned(),
                format!(":{http_port}"),
            ]);
            ports.push(ContainerPort::Tcp(http_port));
        }
        if let Some(otel) = config.otel() {
            args.extend([
                "--otel-endpoint".to_owned(),
                otel.endpoint.clone(),
                "--otel-provider".to_owned(),
                otel.provider.clone(),
            ]);
        }

        Self {
            name: config.image_name().to_owned(),
            tag: config.image_tag().to_owned(),
            args,
            ports,
        }
    }

    /// Arguments passed to the spicedb binary.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for SpiceDb {
    fn default() -> Self {
        Self::new(&SpiceDbConfig::default())
    }
}

impl Image for SpiceDb {
    fn name(&self) -> &str {
        &self.name
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_either_std(READY_MESSAGE)]
    }

    fn cmd(&self) -> impl IntoIterator<Item = impl Into<Cow<'_, str>>> {
        self.args.iter().map(String::as_str)
    }

    fn expose_ports(&self) -> &[ContainerPort] {
        &self.ports
    }
}
