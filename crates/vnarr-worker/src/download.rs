//! Source video download.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// Make sure the video at `url` is present at `dest`, downloading it if needed.
///
/// The body is streamed to a sibling `.part` file and renamed into place, so
/// an interrupted download never looks complete.
pub async fn ensure_local_video(client: &Client, url: &str, dest: &Path) -> WorkerResult<PathBuf> {
    if tokio::fs::try_exists(dest).await? {
        debug!(path = %dest.display(), "Video already downloaded");
        return Ok(dest.to_path_buf());
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(url = %url, path = %dest.display(), "Downloading video");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| WorkerError::download_failed(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(WorkerError::download_failed(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }

    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| WorkerError::download_failed(format!("{}: {}", url, e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, dest).await?;
    info!(path = %dest.display(), bytes = written, "Video downloaded");

    Ok(dest.to_path_buf())
}

/// `dest` with `.part` appended to its full file name.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
