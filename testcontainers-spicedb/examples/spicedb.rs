//! Runs a spicedb container until ctrl-c, for poking at it by hand.
//!
//! ```bash
//! cargo run --example spicedb -- --schema path/to/schema.zed
//! ```

use std::path::PathBuf;

use clap::Parser;
use color_eyre::{Result, eyre::Context as _};
use testcontainers_spicedb::{
    DEFAULT_IMAGE_TAG, DEFAULT_SECRET_KEY, SpiceDbConfig, SpiceDbContainer,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
struct Args {
    /// Tag of the authzed/spicedb image
    #[clap(long, default_value = DEFAULT_IMAGE_TAG)]
    tag: String,
    /// The gRPC pre-shared key
    #[clap(long, env = "SPICEDB_GRPC_PRESHARED_KEY", default_value = DEFAULT_SECRET_KEY)]
    secret_key: String,
    /// Schema file to load once spicedb is up
    #[clap(long)]
    schema: Option<PathBuf>,
    /// Also enable the HTTP gateway on this container port
    #[clap(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let schema = match &args.schema {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let cfg = SpiceDbConfig::builder()
        .image_tag(args.tag)
        .secret_key(args.secret_key)
        .maybe_schema(schema)
        .maybe_http_port(args.http_port)
        .build();
    let mut spicedb = SpiceDbContainer::run(cfg)
        .await
        .wrap_err("failed to start spicedb")?;

    info!(
        endpoint = spicedb.endpoint()?,
        http_endpoint = ?spicedb.http_endpoint()?,
        "spicedb is running, ctrl-c to stop"
    );
    println!("endpoint:   {}", spicedb.endpoint()?);
    println!("secret key: {}", spicedb.secret_key());

    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for ctrl-c")?;
    spicedb.stop().await.wrap_err("failed to stop spicedb")?;

    Ok(())
}
