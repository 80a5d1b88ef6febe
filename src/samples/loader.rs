// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Fetching and decoding pad samples.
//!
//! Sources are fetched in chunks so that download progress can be reported, then decoded
//! entirely into memory for zero-latency playback.

use std::fmt;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::audio::{self, AudioBuffer};

/// Size of the chunks read from local files.
const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Errors produced while loading a pad.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Pad index {0} is out of range")]
    InvalidPadIndex(usize),

    #[error("Unable to fetch {uri}: {reason}")]
    Network { uri: String, reason: String },

    #[error("Unable to decode {uri}: {reason}")]
    Decode { uri: String, reason: String },
}

/// Where a sample comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// An http:// or https:// URL.
    Http(String),
    /// A local file, given as a file:// URI or a plain path.
    File(PathBuf),
}

impl Source {
    /// Parses a source identifier.
    pub fn parse(uri: &str) -> Source {
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Http(uri.to_string())
        } else if let Some(path) = uri.strip_prefix("file://") {
            Source::File(PathBuf::from(path))
        } else {
            Source::File(PathBuf::from(uri))
        }
    }

    /// The file extension of the source, used as a decoding hint.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            Source::Http(url) => match reqwest::Url::parse(url) {
                Ok(url) => PathBuf::from(url.path()),
                Err(_) => return None,
            },
            Source::File(path) => path.clone(),
        };
        path.extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Http(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reports download progress as a percentage. Reported values never decrease and never
/// exceed 100. Nothing is reported when the total size isn't known up front.
struct Progress<'a> {
    callback: &'a mut (dyn FnMut(f64) + Send),
    total: Option<u64>,
    last: f64,
}

impl<'a> Progress<'a> {
    fn new(callback: &'a mut (dyn FnMut(f64) + Send), total: Option<u64>) -> Progress<'a> {
        Progress {
            callback,
            total: total.filter(|total| *total > 0),
            last: 0.0,
        }
    }

    fn advance(&mut self, received: u64) {
        let Some(total) = self.total else {
            return;
        };
        let percent = (received as f64 / total as f64 * 100.0)
            .min(100.0)
            .max(self.last);
        self.last = percent;
        (self.callback)(percent);
    }

    fn finish(&mut self) {
        if self.total.is_some() && self.last < 100.0 {
            self.last = 100.0;
            (self.callback)(100.0);
        }
    }
}

/// Fetches and decodes samples.
#[derive(Clone, Default)]
pub struct SampleLoader {
    client: reqwest::Client,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetches and decodes a source.
    pub async fn load(
        &self,
        source: &Source,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<AudioBuffer, LoadError> {
        info!(source = %source, "Loading sample");
        let bytes = self.fetch(source, on_progress).await?;
        debug!(source = %source, bytes = bytes.len(), "Fetched sample");

        let extension = source.extension();
        let buffer =
            tokio::task::spawn_blocking(move || audio::decode(bytes, extension.as_deref()))
                .await
                .map_err(|e| decode_error(source, e))?
                .map_err(|e| decode_error(source, e))?;

        info!(
            source = %source,
            duration = buffer.duration(),
            channels = buffer.channel_count(),
            memory_kb = buffer.memory_size() / 1024,
            "Sample loaded"
        );
        Ok(buffer)
    }

    /// Fetches the raw bytes of a source, reporting progress as chunks arrive.
    pub async fn fetch(
        &self,
        source: &Source,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<Vec<u8>, LoadError> {
        match source {
            Source::Http(url) => self.fetch_http(source, url, on_progress).await,
            Source::File(path) => fetch_file(source, path, on_progress).await,
        }
    }

    async fn fetch_http(
        &self,
        source: &Source,
        url: &str,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<Vec<u8>, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| network_error(source, e))?;

        let mut progress = Progress::new(on_progress, response.content_length());
        let mut bytes = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network_error(source, e))?;
            bytes.extend_from_slice(&chunk);
            progress.advance(bytes.len() as u64);
        }
        progress.finish();
        Ok(bytes)
    }
}

async fn fetch_file(
    source: &Source,
    path: &Path,
    on_progress: &mut (dyn FnMut(f64) + Send),
) -> Result<Vec<u8>, LoadError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| network_error(source, e))?;
    let total = file
        .metadata()
        .await
        .map_err(|e| network_error(source, e))?
        .len();

    let mut progress = Progress::new(on_progress, Some(total));
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; FILE_CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut chunk)
            .await
            .map_err(|e| network_error(source, e))?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        progress.advance(bytes.len() as u64);
    }
    progress.finish();
    Ok(bytes)
}

fn network_error(source: &Source, e: impl fmt::Display) -> LoadError {
    LoadError::Network {
        uri: source.to_string(),
        reason: e.to_string(),
    }
}

fn decode_error(source: &Source, e: impl fmt::Display) -> LoadError {
    LoadError::Decode {
        uri: source.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::testutil;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::Http("https://example.org/kick.WAV".to_string()),
            Source::parse("https://example.org/kick.WAV")
        );
        assert_eq!(
            Source::File(PathBuf::from("/tmp/snare.flac")),
            Source::parse("file:///tmp/snare.flac")
        );
        assert_eq!(
            Source::File(PathBuf::from("samples/hat.ogg")),
            Source::parse("samples/hat.ogg")
        );
    }

    #[test]
    fn test_source_extension() {
        assert_eq!(
            Some("wav".to_string()),
            Source::parse("https://example.org/kick.WAV?version=2").extension()
        );
        assert_eq!(
            Some("flac".to_string()),
            Source::parse("file:///tmp/snare.flac").extension()
        );
        assert_eq!(None, Source::parse("http://example.org/").extension());
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut reported = Vec::new();
        {
            let mut callback = |percent: f64| reported.push(percent);
            let mut progress = Progress::new(&mut callback, Some(200));
            progress.advance(50);
            progress.advance(40);
            progress.advance(300);
            progress.finish();
        }
        assert_eq!(vec![25.0, 25.0, 100.0], reported);
    }

    #[test]
    fn test_progress_unknown_total() {
        let mut reported = Vec::new();
        {
            let mut callback = |percent: f64| reported.push(percent);
            let mut progress = Progress::new(&mut callback, None);
            progress.advance(50);
            progress.finish();
        }
        assert!(reported.is_empty());
    }

    #[tokio::test]
    async fn test_load_file_reports_progress() {
        let samples: Vec<i16> = vec![1000; 100_000];
        let file = testutil::write_wav(&samples, 1, 44100);

        let mut reported = Vec::new();
        let mut on_progress = |percent: f64| reported.push(percent);
        let loader = SampleLoader::new();
        let buffer = loader
            .load(&Source::File(file.path().to_path_buf()), &mut on_progress)
            .await
            .expect("load failed");

        assert_eq!(100_000, buffer.frames());
        assert!(reported.len() > 1);
        assert!(reported.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(Some(&100.0), reported.last());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_network_error() {
        let loader = SampleLoader::new();
        let result = loader
            .load(&Source::parse("/nonexistent/kick.wav"), &mut |_| {})
            .await;
        assert!(matches!(result, Err(LoadError::Network { .. })));
    }

    #[tokio::test]
    async fn test_load_garbage_is_decode_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .expect("unable to create temp file");
        file.write_all(b"definitely not a wav file")
            .expect("unable to write file");

        let loader = SampleLoader::new();
        let result = loader
            .load(&Source::File(file.path().to_path_buf()), &mut |_| {})
            .await;
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_load_http() {
        let body = testutil::wav_bytes(&[0, 1000, -1000, 0], 1, 8000);
        let url = testutil::serve_once("200 OK", body);

        let mut reported = Vec::new();
        let mut on_progress = |percent: f64| reported.push(percent);
        let buffer = SampleLoader::new()
            .load(&Source::parse(&url), &mut on_progress)
            .await
            .expect("load failed");

        assert_eq!(4, buffer.frames());
        assert_eq!(8000, buffer.sample_rate());
        assert_eq!(Some(&100.0), reported.last());
    }

    #[tokio::test]
    async fn test_load_http_not_found() {
        let url = testutil::serve_once("404 Not Found", b"missing".to_vec());

        let result = SampleLoader::new()
            .load(&Source::parse(&url), &mut |_| {})
            .await;
        match result {
            Err(LoadError::Network { uri, reason }) => {
                assert_eq!(url, uri);
                assert!(reason.contains("404"), "unexpected reason: {}", reason);
            }
            other => panic!("expected network error, got {:?}", other.map(|b| b.frames())),
        }
    }

    #[tokio::test]
    async fn test_load_connection_refused() {
        let url = testutil::unused_url();
        let result = SampleLoader::new()
            .load(&Source::parse(&url), &mut |_| {})
            .await;
        assert!(matches!(result, Err(LoadError::Network { .. })));
    }
}
