//! Fetches the raw dataset files when they are not already on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{InsightsError, Result};
use crate::metrics::MetricsCollector;

/// Where dataset bytes come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the full body at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP(S) source
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recipe-insights/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InsightsError::Download(format!("{url} returned {status}")));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Download `file_name` into `data_dir` unless it already exists.
///
/// Returns the local path. A missing file with no configured URL is an error.
pub async fn download_if_missing(
    source: &dyn DatasetSource,
    file_name: &str,
    url: Option<&str>,
    data_dir: &Path,
    metrics: &MetricsCollector,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(data_dir).await?;

    let file_path = data_dir.join(file_name);
    if tokio::fs::try_exists(&file_path).await? {
        info!("{} already exists in {}. Skipping download.", file_name, file_path.display());
        return Ok(file_path);
    }

    let Some(url) = url else {
        error!("{} is missing and no download URL is configured", file_name);
        return Err(InsightsError::Download(format!(
            "{file_name} not found in {} and no URL configured",
            data_dir.display()
        )));
    };

    info!("Downloading {} to {}...", file_name, file_path.display());
    match source.fetch(url).await {
        Ok(bytes) => {
            // the final path only ever holds a complete file
            let partial = file_path.with_extension("part");
            tokio::fs::write(&partial, &bytes).await?;
            tokio::fs::rename(&partial, &file_path).await?;
            metrics.record_download(file_name, true);
            info!("{} downloaded successfully ({} bytes)", file_name, bytes.len());
            Ok(file_path)
        }
        Err(e) => {
            metrics.record_download(file_name, false);
            error!("Failed to download {}: {}", file_name, e);
            Err(e)
        }
    }
}
