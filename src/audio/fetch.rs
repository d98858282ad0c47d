//! Audio acquisition: download a locator and store it as canonical WAV.
//!
//! [`AudioFetcher`] is the byte-level seam (HTTP in production, canned
//! bytes in tests). [`acquire`] decodes whatever came back and re-encodes
//! it as 16-bit PCM at the source rate and channel count.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::decode::decode_bytes;
use super::encode::write_wav;
use super::AudioError;

/// Downloads may be large; the timeout is generous.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Request(String),

    #[error("download timed out")]
    Timeout,

    #[error("download returned HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AudioFetcher trait
// ---------------------------------------------------------------------------

/// Retrieves the encoded bytes behind a locator.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP(S) GET.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[cfg(test)]
impl HttpFetcher {
    /// Fetcher that ignores proxy environment variables.
    fn direct() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .unwrap();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(locator).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        log::debug!("downloaded {} bytes from {locator}", bytes.len());
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// acquire
// ---------------------------------------------------------------------------

/// File extension of the last path segment of `locator`, ignoring any
/// query string or fragment.
pub fn extension_hint(locator: &str) -> Option<String> {
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Download `locator` and write it to `dest` as 16-bit PCM WAV.
///
/// Decode and encode run on the blocking pool. No retry.
pub async fn acquire(
    fetcher: &dyn AudioFetcher,
    locator: &str,
    dest: &Path,
) -> Result<PathBuf, FetchError> {
    let bytes = fetcher.fetch(locator).await?;
    let hint = extension_hint(locator);
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<PathBuf, FetchError> {
        let clip = decode_bytes(bytes, hint.as_deref())?;
        write_wav(&dest, &clip)?;
        log::info!(
            "saved {} ({:.1}s, {}Hz, {}ch)",
            dest.display(),
            clip.duration_secs(),
            clip.sample_rate(),
            clip.channels()
        );
        Ok(dest)
    })
    .await
    .map_err(|e| FetchError::Request(format!("transcode task failed: {e}")))?
}

// ---------------------------------------------------------------------------
// StaticFetcher  (test-only)
// ---------------------------------------------------------------------------

/// Serves the same bytes for every locator and records what was asked for.
#[cfg(test)]
pub struct StaticFetcher {
    bytes: Vec<u8>,
    requested: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            requested: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl AudioFetcher for StaticFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.lock().unwrap().push(locator.to_string());
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode::encode_wav;
    use crate::audio::AudioClip;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer exactly one HTTP request with `status_line` and an empty body.
    async fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/out.wav")
    }

    #[test]
    fn extension_from_url() {
        assert_eq!(
            extension_hint("https://replicate.delivery/x/out.MP3?sig=abc").as_deref(),
            Some("mp3")
        );
        assert_eq!(extension_hint("https://host/a/b.wav#t=1").as_deref(), Some("wav"));
        assert_eq!(extension_hint("https://host/a/noext"), None);
        assert_eq!(extension_hint("https://host/a/trailing."), None);
    }

    #[test]
    fn fetch_error_wraps_audio_error() {
        let e: FetchError = AudioError::Decode("bad".into()).into();
        assert!(matches!(e, FetchError::Audio(AudioError::Decode(_))));
    }

    #[tokio::test]
    async fn acquire_writes_canonical_wav() {
        let clip = AudioClip::new(vec![0.1_f32; 2 * 4_800], 48_000, 2);
        let fetcher = StaticFetcher::new(encode_wav(&clip).unwrap());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("audio").join("song_01.wav");

        let written = acquire(&fetcher, "https://x/out.wav", &dest).await.unwrap();

        assert_eq!(written, dest);
        assert_eq!(fetcher.requested(), vec!["https://x/out.wav".to_string()]);
        let spec = hound::WavReader::open(&dest).unwrap().spec();
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[tokio::test]
    async fn undecodable_download_fails_without_output() {
        let fetcher = StaticFetcher::new(b"<html>503</html>".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("song_01.wav");

        let err = acquire(&fetcher, "https://x/out.mp3", &dest).await.unwrap_err();

        assert!(matches!(err, FetchError::Audio(AudioError::Decode(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let url = serve_once("404 Not Found").await;

        let err = HttpFetcher::direct().fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status(404)), "{err:?}");
    }

    #[tokio::test]
    async fn acquire_on_http_error_writes_nothing() {
        let url = serve_once("503 Service Unavailable").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("audio").join("song_01.wav");

        let err = acquire(&HttpFetcher::direct(), &url, &dest).await.unwrap_err();

        assert!(matches!(err, FetchError::Status(503)), "{err:?}");
        assert!(!dest.exists());
        assert!(!dest.parent().unwrap().exists());
    }
}
