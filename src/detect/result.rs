use serde::Serialize;

/// Class label the crowd count is taken from. Matched exactly.
pub const PERSON_LABEL: &str = "person";

/// Axis-aligned box in normalized image coordinates (0..1, origin top-left).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.w).min(other.x + other.w);
        let y2 = (self.y + self.h).min(other.y + other.h);
        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// A single object found in an image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    pub fn is_person(&self) -> bool {
        self.label == PERSON_LABEL
    }
}

/// Result of running detection on a frame.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionResult {
    /// Backend that produced the detections.
    pub backend: String,
    /// Detections, highest confidence first.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(backend: impl Into<String>, mut detections: Vec<Detection>) -> Self {
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self {
            backend: backend.into(),
            detections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BoundingBox { x: 0.1, y: 0.1, w: 0.2, h: 0.2 };
        let b = BoundingBox { x: 0.6, y: 0.6, w: 0.2, h: 0.2 };
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn person_match_is_exact() {
        let bbox = BoundingBox::default();
        assert!(Detection::new("person", 0.9, bbox).is_person());
        assert!(!Detection::new("Person", 0.9, bbox).is_person());
        assert!(!Detection::new("persons", 0.9, bbox).is_person());
    }

    #[test]
    fn result_sorts_by_confidence() {
        let bbox = BoundingBox::default();
        let result = DetectionResult::new(
            "stub",
            vec![
                Detection::new("dog", 0.4, bbox),
                Detection::new("person", 0.8, bbox),
            ],
        );
        assert_eq!(result.detections[0].label, "person");
        assert_eq!(result.len(), 2);
    }
}
