//! Local image file source.
//!
//! `ImageSource` reads a single still image from a local path and decodes it
//! in-memory to RGB8. It is responsible for:
//! - Rejecting URL schemes (no network fetches)
//! - Reporting a missing file by path
//! - Decoding JPEG/PNG into a `Frame`
//!
//! Paths beginning with `stub://` produce a synthetic frame instead of reading
//! from disk, for tests and dry runs.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use crate::frame::Frame;

const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

/// Local image source.
pub struct ImageSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Disk(PathBuf),
    Synthetic(String),
}

impl ImageSource {
    pub fn new(path: &str) -> Result<Self> {
        if !is_local_file_path(path) {
            return Err(anyhow!(
                "image input only supports local paths (no URL schemes): {}",
                path
            ));
        }
        let backend = if path.starts_with("stub://") {
            SourceBackend::Synthetic(path.to_string())
        } else {
            SourceBackend::Disk(PathBuf::from(path))
        };
        Ok(Self { backend })
    }

    /// Human-readable location of the image.
    pub fn location(&self) -> String {
        match &self.backend {
            SourceBackend::Disk(path) => path.display().to_string(),
            SourceBackend::Synthetic(name) => name.clone(),
        }
    }

    /// Read and decode the image.
    pub fn load(&self) -> Result<Frame> {
        match &self.backend {
            SourceBackend::Disk(path) => load_from_disk(path),
            SourceBackend::Synthetic(name) => {
                log::info!("ImageSource: generating synthetic frame for {}", name);
                synthetic_frame()
            }
        }
    }
}

fn load_from_disk(path: &Path) -> Result<Frame> {
    if !path.exists() {
        return Err(anyhow!("cannot find {}", path.display()));
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    let frame = decode_image(&bytes).with_context(|| format!("failed to decode {}", path.display()))?;
    log::debug!(
        "ImageSource: loaded {} ({}x{})",
        path.display(),
        frame.width(),
        frame.height()
    );
    Ok(frame)
}

/// Decode encoded image bytes (format sniffed from content) into a frame.
pub fn decode_image(bytes: &[u8]) -> Result<Frame> {
    if bytes.is_empty() {
        return Err(anyhow!("empty image data"));
    }
    let image = image::load_from_memory(bytes).context("decode image")?;
    Frame::from_image(image.into_rgb8())
}

fn synthetic_frame() -> Result<Frame> {
    let pixel_count = (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize;
    let pixels = (0..pixel_count).map(|i| (i % 256) as u8).collect();
    Frame::from_rgb(pixels, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}
