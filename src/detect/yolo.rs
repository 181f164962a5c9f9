//! YOLOv8 output decoding.
//!
//! The detection head emits a `[1, 4 + C, N]` tensor: for each of `N` anchor
//! candidates, a box `(cx, cy, w, h)` in letterboxed input pixels followed by
//! `C` class scores. Decoding keeps the best class per candidate, drops
//! candidates under the confidence threshold, runs per-class NMS and maps the
//! surviving boxes back to normalized source-image coordinates.

use anyhow::{anyhow, Result};

use crate::detect::labels::class_name;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Letterbox;

/// Post-processing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    class_id: usize,
    score: f32,
    // Letterboxed pixels: x1, y1, x2, y2.
    corners: [f32; 4],
}

impl Candidate {
    fn as_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.corners[0],
            y: self.corners[1],
            w: self.corners[2] - self.corners[0],
            h: self.corners[3] - self.corners[1],
        }
    }
}

/// Decode a row-major `[4 + classes, anchors]` slice.
pub fn decode(
    data: &[f32],
    classes: usize,
    anchors: usize,
    letterbox: &Letterbox,
    source_size: (u32, u32),
    params: &YoloParams,
) -> Result<Vec<Detection>> {
    if classes == 0 {
        return Err(anyhow!("model output has no class scores"));
    }
    let rows = 4 + classes;
    let expected = rows
        .checked_mul(anchors)
        .ok_or_else(|| anyhow!("model output dimensions overflow"))?;
    if data.len() != expected {
        return Err(anyhow!(
            "expected {} output values for {}x{}, got {}",
            expected,
            rows,
            anchors,
            data.len()
        ));
    }

    let at = |row: usize, col: usize| data[row * anchors + col];
    let mut candidates = Vec::new();
    for col in 0..anchors {
        let (class_id, score) = (0..classes)
            .map(|c| (c, at(4 + c, col)))
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if !score.is_finite() || score < params.conf_threshold {
            continue;
        }
        let (cx, cy, w, h) = (at(0, col), at(1, col), at(2, col), at(3, col));
        candidates.push(Candidate {
            class_id,
            score,
            corners: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
    }

    let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
    let (src_w, src_h) = (source_size.0 as f32, source_size.1 as f32);
    Ok(kept
        .into_iter()
        .map(|cand| {
            let (x1, y1) = letterbox.to_source(cand.corners[0], cand.corners[1]);
            let (x2, y2) = letterbox.to_source(cand.corners[2], cand.corners[3]);
            let x1 = (x1 / src_w).clamp(0.0, 1.0);
            let y1 = (y1 / src_h).clamp(0.0, 1.0);
            let x2 = (x2 / src_w).clamp(0.0, 1.0);
            let y2 = (y2 / src_h).clamp(0.0, 1.0);
            Detection::new(
                class_name(cand.class_id),
                cand.score,
                BoundingBox {
                    x: x1,
                    y: y1,
                    w: x2 - x1,
                    h: y2 - y1,
                },
            )
        })
        .collect())
}

/// Greedy per-class NMS, highest score first.
fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == cand.class_id && k.as_box().iou(&cand.as_box()) > iou_threshold
        });
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}
