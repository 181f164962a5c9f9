#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::DetectionResult;
use crate::detect::yolo::{self, YoloParams};
use crate::frame::{Frame, Letterbox};

/// Tract-based backend for YOLOv8 ONNX models.
///
/// Loads a local model file once and runs inference on letterboxed RGB input.
/// No network I/O; the only disk access is the model load.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    params: YoloParams,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for a square input.
    pub fn new<P: AsRef<Path>>(model_path: P, params: YoloParams) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(anyhow!("cannot find model {}", model_path.display()));
        }
        let size = params.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "tract backend loaded {} (input {}x{})",
            model_path.display(),
            size,
            size
        );
        Ok(Self { model, params })
    }

    fn build_input(&self, letterbox: &Letterbox) -> Tensor {
        let size = self.params.input_size as usize;
        let image = &letterbox.image;
        tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
            image.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        })
        .into_tensor()
    }

    fn extract_detections(
        &self,
        outputs: TVec<TValue>,
        letterbox: &Letterbox,
        frame: &Frame,
    ) -> Result<DetectionResult> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
            return Err(anyhow!("unexpected YOLO output shape {:?}", shape));
        }
        let (rows, anchors) = (shape[1], shape[2]);
        let data: Vec<f32> = view.iter().copied().collect();
        let detections = yolo::decode(
            &data,
            rows - 4,
            anchors,
            letterbox,
            (frame.width(), frame.height()),
            &self.params,
        )?;
        Ok(DetectionResult::new(self.name(), detections))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let letterbox = frame.letterbox(self.params.input_size)?;
        let input = self.build_input(&letterbox);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_detections(outputs, &letterbox, frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.params.input_size as usize;
        let blank = Tensor::zero::<f32>(&[1, 3, size, size]).context("allocate warm-up tensor")?;
        self.model
            .run(tvec!(blank.into()))
            .context("ONNX warm-up failed")?;
        Ok(())
    }
}
