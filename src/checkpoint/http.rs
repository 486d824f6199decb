use std::{sync::Arc, time::Duration};

use reqwest::blocking::Client;

use super::CheckpointSource;
use crate::{Result, VolumeErr};

const USER_AGENT: &str = concat!("volumetric_body/", env!("CARGO_PKG_VERSION"));

/// Downloads checkpoints over http(s), blocking the caller until the body is read.
///
/// There is no timeout unless one is configured and failures are never retried.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Creates a new `HttpSource` without timeout.
    ///
    /// # Returns
    /// An error if the underlying http client can't be initialized.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Creates a new `HttpSource` that gives up on requests taking longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| VolumeErr::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client })
    }
}

impl CheckpointSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Arc<[u8]>> {
        let fetch_err = |reason: String| VolumeErr::CheckpointFetch {
            url: url.to_string(),
            reason,
        };

        log::info!("downloading checkpoint {url}");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("server answered {status}")));
        }

        let bytes = response.bytes().map_err(|e| fetch_err(e.to_string()))?;
        log::debug!("downloaded {} bytes from {url}", bytes.len());
        Ok(Arc::from(bytes.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host() {
        let source = HttpSource::with_timeout(Duration::from_millis(200)).unwrap();

        let err = source.fetch("http://127.0.0.1:9/missing.safetensors").unwrap_err();

        assert!(matches!(err, VolumeErr::CheckpointFetch { .. }));
    }
}
