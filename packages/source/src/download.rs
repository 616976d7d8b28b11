//! Streaming downloads of map images and boundary files.

use std::path::Path;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::SourceError;

/// Google Static Maps endpoint.
pub const STATIC_MAPS_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Hybrid satellite image centred on a point.
#[must_use]
pub fn satellite_image_url(latitude: f64, longitude: f64, key: &str) -> String {
    format!(
        "{STATIC_MAPS_URL}?center={latitude},{longitude}&size=500x500&zoom=20&maptype=hybrid&scale=2&key={key}"
    )
}

/// Streams the body at `url` into `dest`, replacing any existing file.
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the status is not a
/// success, or the file cannot be written.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, SourceError> {
    let io_err = |source| SourceError::Io {
        path: dest.display().to_string(),
        source,
    };

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    log::debug!("Downloaded {written} bytes to {}", dest.display());
    Ok(written)
}
