//! Image ingestion.
//!
//! Sources produce decoded `Frame` instances for the detector. Only local
//! files are supported; remote fetching is out of scope for this layer.

pub mod file;

pub use file::{decode_image, ImageSource};
