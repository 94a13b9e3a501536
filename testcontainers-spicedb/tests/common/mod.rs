//! Helpers for tests.

// Each test binary only uses some of these.
#![allow(dead_code)]

use color_eyre::{
    Result,
    eyre::{Context as _, ensure},
};
use testcontainers_spicedb::{SpiceDbContainer, client::SchemaClient};

pub const MODEL: &str = "
definition user {}

definition platform {
    relation administrator: user
    permission super_admin = administrator
}
";

/// Connects to `spicedb` with its own secret key.
pub async fn client(spicedb: &SpiceDbContainer) -> Result<SchemaClient> {
    connect(spicedb, spicedb.secret_key()).await
}

pub async fn connect(
    spicedb: &SpiceDbContainer,
    credential: &str,
) -> Result<SchemaClient> {
    let endpoint = spicedb.endpoint()?;

    SchemaClient::connect(endpoint, credential)
        .await
        .wrap_err_with(|| format!("failed to connect to spicedb at {endpoint}"))
}

/// Checks that `endpoint` looks like `host:port`, with a non-zero port.
pub fn check_endpoint(endpoint: &str) -> Result<()> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| color_eyre::eyre::eyre!("no port in {endpoint:?}"))?;
    let port: u16 = port
        .parse()
        .wrap_err_with(|| format!("port of {endpoint:?} is not numeric"))?;

    ensure!(!host.is_empty(), "no host in {endpoint:?}");
    ensure!(port != 0, "port of {endpoint:?} is zero");

    Ok(())
}

/// Both schemas define the same object types, ignoring formatting.
pub fn check_same_definitions(expected: &str, actual: &str) -> Result<()> {
    let definitions = |schema: &str| {
        let mut names: Vec<String> = schema
            .split_whitespace()
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| w[0] == "definition")
            .map(|w| w[1].trim_end_matches('{').to_owned())
            .collect();
        names.sort();
        names
    };

    let expected_defs = definitions(expected);
    ensure!(!expected_defs.is_empty(), "expected schema has no definitions");
    ensure!(
        expected_defs == definitions(actual),
        "definitions differ: expected {expected_defs:?} in {actual:?}"
    );
    for relation in ["administrator", "super_admin"] {
        ensure!(
            actual.contains(relation) == expected.contains(relation),
            "{relation} differs between schemas"
        );
    }

    Ok(())
}
