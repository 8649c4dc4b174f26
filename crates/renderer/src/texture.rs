use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use backdrop::ResourceLoadError;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use image::imageops::flip_vertical_in_place;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::types::TextureSource;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// RGBA8 pixels ready for upload, bottom row first.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Fetches and decodes the texture on the calling thread.
///
/// With a cache directory, a successful remote fetch is stored there and a
/// failed one falls back to the stored copy.
pub fn load(
    source: &TextureSource,
    cache_dir: Option<&Path>,
) -> Result<DecodedTexture, ResourceLoadError> {
    let url = source.to_string();
    let cache_path = cache_dir
        .zip(source.cache_file_name())
        .map(|(dir, name)| dir.join(name));
    let bytes = match source {
        TextureSource::Remote(remote) => match fetch(remote) {
            Ok(bytes) => {
                if let Some(path) = &cache_path {
                    store_cached(path, &bytes);
                }
                bytes
            }
            Err(err) => match cache_path.as_deref().and_then(read_cached) {
                Some(bytes) => {
                    warn!(%remote, error = %err, "texture fetch failed; using cached copy");
                    bytes
                }
                None => return Err(ResourceLoadError::new(url.as_str(), err)),
            },
        },
        TextureSource::File(path) => {
            debug!(path = %path.display(), "reading background texture");
            fs::read(path).map_err(|err| ResourceLoadError::new(url.as_str(), err))?
        }
    };
    decode(&url, &bytes)
}

fn fetch(remote: &Url) -> Result<Vec<u8>, reqwest::Error> {
    debug!(%remote, "fetching background texture");
    let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(remote.clone()).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

fn read_cached(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

fn store_cached(path: &Path, bytes: &[u8]) {
    let result = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::write(path, bytes));
    match result {
        Ok(()) => debug!(path = %path.display(), "cached background texture"),
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "failed to cache background texture"
        ),
    }
}

/// Decodes an encoded image and flips it so row zero is the bottom edge,
/// matching the `vUv` origin the shaders expect.
pub fn decode(source_url: &str, bytes: &[u8]) -> Result<DecodedTexture, ResourceLoadError> {
    let image =
        image::load_from_memory(bytes).map_err(|err| ResourceLoadError::new(source_url, err))?;
    let mut rgba = image.to_rgba8();
    flip_vertical_in_place(&mut rgba);
    let (width, height) = rgba.dimensions();
    Ok(DecodedTexture {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

pub type TextureResult = Result<DecodedTexture, ResourceLoadError>;

/// Background fetch whose result is picked up by the event loop.
///
/// `notify` runs on the loader thread once the result is queued; the window
/// uses it to wake the event loop.
pub struct TextureLoader {
    results: Receiver<TextureResult>,
    join_handle: Option<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn spawn<F>(source: TextureSource, cache_dir: Option<PathBuf>, notify: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("spores-texture".into())
            .spawn(move || {
                let result = load(&source, cache_dir.as_deref());
                if let Ok(texture) = &result {
                    info!(
                        source = %source,
                        width = texture.width,
                        height = texture.height,
                        "background texture decoded"
                    );
                }
                if tx.send(result).is_ok() {
                    notify();
                }
            })
            .map_err(|err| anyhow!("failed to spawn texture loader thread: {err}"))?;

        Ok(Self {
            results: rx,
            join_handle: Some(handle),
        })
    }

    /// Returns the result once it is available; yields it at most once.
    pub fn try_take(&mut self) -> Option<TextureResult> {
        match self.results.try_recv() {
            Ok(result) => {
                if let Some(handle) = self.join_handle.take() {
                    let _ = handle.join();
                }
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until the loader finishes or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<TextureResult> {
        let result = self.results.recv_timeout(timeout).ok()?;
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
        Some(result)
    }
}
