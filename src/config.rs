//! Configuration loading, validation, and runtime state.
//!
//! The gateway reads its YAML configuration exactly once at startup.
//! Base URLs are parsed and validated at load time so the request path
//! never touches the filesystem or re-parses URLs.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{GatewayError, Result};

/// Default socket address the gateway binds to.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8100";

/// Default base URL of the upstream posts resource.
pub const DEFAULT_POST_BASE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default base URL of the upstream comments resource.
pub const DEFAULT_COMMENT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/comments";

/// Default total request timeout covering the entire upstream round-trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default idle timeout for pooled upstream connections.
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum number of idle connections kept per upstream host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Raw configuration as deserialized from the YAML file.
///
/// This struct maps directly to the on-disk schema. After loading, it is
/// transformed into a [`RuntimeConfig`] holding parsed addresses and URLs.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Socket address the gateway listens on (default `"127.0.0.1:8100"`).
    #[serde(default)]
    pub listen: Option<String>,
    /// Base URL of the upstream posts resource.
    #[serde(default)]
    pub post_base_url: Option<String>,
    /// Base URL of the upstream comments resource.
    #[serde(default)]
    pub comment_base_url: Option<String>,
    /// Total upstream request timeout in milliseconds (default: 30000).
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    /// Idle timeout in milliseconds for pooled connections (default: 60000).
    #[serde(default)]
    pub pool_idle_timeout_ms: Option<u64>,
    /// Maximum idle connections kept per upstream host (default: 32).
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

/// Fully validated, ready-to-use configuration.
///
/// Created once at startup and shared with the upstream client and server.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Socket address the gateway binds to.
    pub listen: SocketAddr,
    /// Validated base URL for post queries and post-by-id fetches.
    pub post_base: Url,
    /// Validated base URL for comment queries.
    pub comment_base: Url,
    /// Total request timeout for the upstream round-trip.
    pub request_timeout: Duration,
    /// Idle timeout for pooled upstream connections.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per upstream host.
    pub pool_max_idle_per_host: usize,
}

/// Validates a base URL string: absolute, http(s), with a host.
fn validate_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::Config(format!("invalid base URL \"{raw}\": {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(GatewayError::Config(format!(
            "base URL must use http or https: {raw}"
        )));
    }

    if url.host_str().is_none() {
        return Err(GatewayError::Config(format!("base URL has no host: {raw}")));
    }

    Ok(url)
}

impl Config {
    /// Loads configuration from a YAML file at the given path.
    ///
    /// Returns a [`GatewayError::Config`] if the file cannot be opened or
    /// its contents fail YAML deserialization.
    pub fn load_from_file(file_path: &(impl AsRef<Path> + ?Sized)) -> Result<Self> {
        let file = std::fs::File::open(file_path).map_err(|e| {
            GatewayError::Config(format!(
                "failed to open {}: {e}",
                file_path.as_ref().display()
            ))
        })?;

        serde_yaml::from_reader(file)
            .map_err(|e| GatewayError::Config(format!("failed to parse config: {e}")))
    }

    /// Validates all fields, producing a [`RuntimeConfig`].
    pub fn into_runtime(self) -> Result<RuntimeConfig> {
        let listen_str = self.listen.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR);
        let listen = listen_str.parse::<SocketAddr>().map_err(|e| {
            GatewayError::Config(format!("invalid listen address \"{listen_str}\": {e}"))
        })?;

        let post_base =
            validate_base_url(self.post_base_url.as_deref().unwrap_or(DEFAULT_POST_BASE_URL))?;

        let comment_base = validate_base_url(
            self.comment_base_url
                .as_deref()
                .unwrap_or(DEFAULT_COMMENT_BASE_URL),
        )?;

        let request_timeout = self
            .request_timeout_ms
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_millis);

        let pool_idle_timeout = self
            .pool_idle_timeout_ms
            .map_or(DEFAULT_POOL_IDLE_TIMEOUT, Duration::from_millis);

        let pool_max_idle_per_host = self
            .pool_max_idle_per_host
            .unwrap_or(DEFAULT_POOL_MAX_IDLE_PER_HOST);

        Ok(RuntimeConfig {
            listen,
            post_base,
            comment_base,
            request_timeout,
            pool_idle_timeout,
            pool_max_idle_per_host,
        })
    }
}
