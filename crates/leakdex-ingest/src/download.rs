//! Fetching remote uploads.

use crate::classify::classify;
use crate::error::{IngestError, IngestResult};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use leakdex_core::SourceFormat;
use reqwest::{Client, Url};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A remote upload spooled to a temporary file.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct Download {
    /// Label stored as `leak_source`. May be replaced before ingesting.
    pub source_name: String,
    /// `Content-Type` reported by the server.
    pub content_type: Option<String>,
    /// Format picked from the URL name and content type.
    pub format: SourceFormat,
    /// Bytes written to disk.
    pub bytes: u64,
    file: NamedTempFile,
}

impl Download {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Label for an upload fetched from `url`: `url_` plus the last path segment.
pub fn source_name_for_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "download".to_string());
    format!("url_{}", segment)
}

/// Stream `url` into a temporary file in `dir` (or the system temp dir).
pub async fn download(client: &Client, url: &str, dir: Option<&Path>) -> IngestResult<Download> {
    let fail = |message: String| IngestError::Download {
        url: url.to_string(),
        message,
    };

    let parsed = Url::parse(url).map_err(|e| fail(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(fail(format!("unsupported scheme {}", parsed.scheme())));
    }

    let source_name = source_name_for_url(&parsed);
    info!("Downloading {} as {}", url, source_name);

    let response = client.get(parsed).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("server returned {}", status)));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut builder = tempfile::Builder::new();
    builder.prefix("leakdex-");
    let temp = match dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };

    let mut file = tokio::fs::File::from_std(temp.as_file().try_clone()?);
    let mut stream = response.bytes_stream();
    let mut bytes = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
    }
    file.flush().await?;

    debug!("Downloaded {} bytes to {}", bytes, temp.path().display());

    let format = classify(&source_name, content_type.as_deref());
    Ok(Download {
        source_name,
        content_type,
        format,
        bytes,
        file: temp,
    })
}
