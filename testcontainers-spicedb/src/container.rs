use std::{sync::Arc, time::Duration};

use testcontainers::{
    ContainerAsync, ContainerRequest, ImageExt as _, TestcontainersError,
    bollard::errors::Error as BollardError,
    core::error::{ClientError, WaitContainerError},
    runners::AsyncRunner as _,
};
use tokio::net::ToSocketAddrs;
use tracing::{debug, info, instrument, warn};

use crate::{Error, Result, SchemaWriter, SpiceDb, SpiceDbConfig};

/// A spicedb instance running in docker.
///
/// Created stopped, with [`Self::new()`]. [`Self::start()`] brings it up and
/// [`Self::stop()`] removes the container. Dropping a started container also
/// removes it.
#[derive(Debug)]
pub struct SpiceDbContainer {
    config: SpiceDbConfig,
    schema_load: Option<SchemaLoad>,
    running: Option<Running>,
}

/// Everything needed to load the configured schema, resolved up front.
#[derive(Debug)]
struct SchemaLoad {
    schema: String,
    credential: String,
    writer: Arc<dyn SchemaWriter>,
}

#[derive(Debug)]
struct Running {
    container: ContainerAsync<SpiceDb>,
    endpoint: String,
    http_endpoint: Option<String>,
}

impl SpiceDbContainer {
    /// Validates `config`. Does not create a container yet.
    pub fn new(config: SpiceDbConfig) -> Result<Self> {
        config.validate()?;

        let schema_load = match config.schema() {
            Some(schema) => {
                let writer = config.resolve_schema_writer().ok_or_else(|| {
                    Error::Configuration(
                        "a schema was given but there is no schema writer".to_owned(),
                    )
                })?;
                Some(SchemaLoad {
                    schema: schema.to_owned(),
                    credential: config.schema_secret_key().to_owned(),
                    writer,
                })
            }
            None => None,
        };

        Ok(Self {
            config,
            schema_load,
            running: None,
        })
    }

    /// [`Self::new()`] followed by [`Self::start()`].
    pub async fn run(config: SpiceDbConfig) -> Result<Self> {
        let mut spicedb = Self::new(config)?;
        spicedb.start().await?;

        Ok(spicedb)
    }

    /// Starts spicedb, runs `f` with it, then stops it.
    ///
    /// If `f` panics the container is still removed, by [`Drop`].
    pub async fn scoped<T>(
        config: SpiceDbConfig,
        f: impl AsyncFnOnce(&SpiceDbContainer) -> T,
    ) -> Result<T> {
        let mut spicedb = Self::run(config).await?;
        let output = f(&spicedb).await;
        spicedb.stop().await?;

        Ok(output)
    }

    /// Pulls the image, starts the container, waits until spicedb accepts
    /// connections, then loads the schema if one was configured.
    ///
    /// The startup timeout covers starting the container and waiting for it, not
    /// the image pull. Does nothing if already running.
    #[instrument(skip_all, fields(image = %self.config.image()))]
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            debug!("spicedb already running");
            return Ok(());
        }

        let running = self.launch().await?;
        info!(
            id = running.container.id(),
            endpoint = %running.endpoint,
            "spicedb is ready"
        );
        self.running = Some(running);

        self.load_schema_if_configured().await
    }

    async fn launch(&self) -> Result<Running> {
        let timeout = self.config.startup_timeout();

        let request = container_request(&self.config).pull_image().await?;
        debug!("pulled image");
        let container = request
            .start()
            .await
            .map_err(|err| start_error(err, timeout))?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(self.config.port()).await?;
        let endpoint = format!("{host}:{port}");

        // the log line can show up before the port is forwarded
        tokio::time::timeout(timeout, wait_for_tcp(&endpoint))
            .await
            .map_err(|_| Error::StartupTimeout(timeout))?;

        let http_endpoint = match self.config.http_port() {
            Some(http_port) => {
                let port = container.get_host_port_ipv4(http_port).await?;
                Some(format!("{host}:{port}"))
            }
            None => None,
        };

        Ok(Running {
            container,
            endpoint,
            http_endpoint,
        })
    }

    async fn load_schema_if_configured(&mut self) -> Result<()> {
        let Some(load) = &self.schema_load else {
            return Ok(());
        };

        let endpoint = self.endpoint()?;
        let Err(err) = load
            .writer
            .write_schema(endpoint, &load.credential, &load.schema)
            .await
        else {
            info!("loaded schema");
            return Ok(());
        };

        warn!("failed to load schema, removing container: {err}");
        if let Err(stop_err) = self.stop().await {
            warn!("failed to remove container: {stop_err:?}");
        }

        Err(Error::SchemaLoad(err))
    }

    /// `host:port` of the gRPC api.
    pub fn endpoint(&self) -> Result<&str> {
        self.running
            .as_ref()
            .map(|r| r.endpoint.as_str())
            .ok_or(Error::NotStarted)
    }

    /// `host:port` of the HTTP gateway, if [`SpiceDbConfig::http_port`] is set.
    pub fn http_endpoint(&self) -> Result<Option<&str>> {
        self.running
            .as_ref()
            .map(|r| r.http_endpoint.as_deref())
            .ok_or(Error::NotStarted)
    }

    /// The gRPC pre-shared key.
    pub fn secret_key(&self) -> &str {
        self.config.secret_key()
    }

    /// Docker id of the container.
    pub fn id(&self) -> Result<&str> {
        self.running
            .as_ref()
            .map(|r| r.container.id())
            .ok_or(Error::NotStarted)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn config(&self) -> &SpiceDbConfig {
        &self.config
    }

    /// Stops and removes the container. Calling this when nothing is running,
    /// or after the container was removed behind our back, is fine.
    #[instrument(skip_all)]
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            debug!("spicedb not running, nothing to stop");
            return Ok(());
        };

        let id = running.container.id().to_owned();
        match running.container.rm().await {
            Ok(()) => info!(%id, "removed spicedb container"),
            Err(err) if is_missing_container(&err) => {
                debug!(%id, "spicedb container was already gone");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(())
    }
}

/// The testcontainers request for `config`, with its startup timeout.
fn container_request(config: &SpiceDbConfig) -> ContainerRequest<SpiceDb> {
    SpiceDb::new(config).with_startup_timeout(config.startup_timeout())
}

fn start_error(err: TestcontainersError, timeout: Duration) -> Error {
    match err {
        TestcontainersError::WaitContainer(WaitContainerError::StartupTimeout) => {
            Error::StartupTimeout(timeout)
        }
        err => err.into(),
    }
}

fn is_missing_container(err: &TestcontainersError) -> bool {
    matches!(
        err,
        TestcontainersError::Client(ClientError::RemoveContainer(
            BollardError::DockerResponseServerError {
                status_code: 404,
                ..
            }
        ))
    )
}

async fn wait_for_tcp(addr: impl ToSocketAddrs) {
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    loop {
        interval.tick().await;
        if tokio::net::TcpStream::connect(&addr).await.is_ok() {
            return;
        }
    }
}
