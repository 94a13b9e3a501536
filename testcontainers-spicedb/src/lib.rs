//! Runs [SpiceDB] in a docker container, for use in integration tests.
//!
//! Start with [`SpiceDbConfig::builder()`] and [`SpiceDbContainer::run()`]:
//!
//! ```no_run
//! # async fn example() -> Result<(), testcontainers_spicedb::Error> {
//! use testcontainers_spicedb::{SpiceDbConfig, SpiceDbContainer};
//!
//! let config = SpiceDbConfig::builder()
//!     .schema("definition user {}")
//!     .build();
//! let mut spicedb = SpiceDbContainer::run(config).await?;
//!
//! let endpoint = spicedb.endpoint()?; // host:port of the gRPC api
//! let key = spicedb.secret_key(); // "somepresharedkey" unless overridden
//! # let _ = (endpoint, key);
//!
//! spicedb.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The container is also removed when the [`SpiceDbContainer`] is dropped, so an
//! early return or a panic in a test doesn't leak it.
//!
//! [SpiceDB]: https://authzed.com/spicedb

#[cfg(feature = "grpc")]
pub mod client;
mod config;
mod container;
mod error;
mod image;
mod writer;

pub use crate::config::{
    DEFAULT_SECRET_KEY, DEFAULT_STARTUP_TIMEOUT, SpiceDbConfig,
};
pub use crate::container::SpiceDbContainer;
pub use crate::error::{BoxError, Error, Result};
pub use crate::image::{
    DEFAULT_GRPC_PORT, DEFAULT_IMAGE_NAME, DEFAULT_IMAGE_TAG, OtelConfig,
    READY_MESSAGE, SpiceDb,
};
#[cfg(feature = "grpc")]
pub use crate::writer::GrpcSchemaWriter;
pub use crate::writer::{SchemaWriter, schema_writer_fn};
