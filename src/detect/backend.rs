use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Object detector backend.
///
/// Backends consume a decoded frame and return labelled detections. Labels
/// use the model's class names verbatim; counting relies on the exact string
/// `"person"`.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
