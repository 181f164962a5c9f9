//! In-memory image frames.
//!
//! - `Frame`: decoded RGB8 pixels plus dimensions. The byte length is checked
//!   at construction, so detectors can index pixels without re-validating.
//! - `Letterbox`: square model input produced from a frame, with the scale and
//!   padding needed to map detections back onto the original image.

use anyhow::{anyhow, Result};
use image::{imageops, imageops::FilterType, Rgb, RgbImage};

/// Decoded RGB8 image.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Build a frame from tightly packed RGB8 bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn from_image(image: RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_rgb(image.into_raw(), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))
    }

    /// Resize into a `size` x `size` square, keeping aspect ratio and padding
    /// the remainder with mid-grey.
    pub fn letterbox(&self, size: u32) -> Result<Letterbox> {
        if size == 0 {
            return Err(anyhow!("letterbox size must be non-zero"));
        }
        let scale = (size as f32 / self.width as f32).min(size as f32 / self.height as f32);
        let scaled_w = ((self.width as f32 * scale).round() as u32).clamp(1, size);
        let scaled_h = ((self.height as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = (size - scaled_w) / 2;
        let pad_y = (size - scaled_h) / 2;

        let resized = imageops::resize(&self.to_image()?, scaled_w, scaled_h, FilterType::Triangle);
        let mut canvas = RgbImage::from_pixel(size, size, Rgb([114, 114, 114]));
        imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

        Ok(Letterbox {
            image: canvas,
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Square model input and the transform back to source coordinates.
pub struct Letterbox {
    pub image: RgbImage,
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a point in letterboxed pixels back to source pixels.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}
