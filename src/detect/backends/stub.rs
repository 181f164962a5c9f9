use anyhow::{anyhow, Result};
use std::str::FromStr;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, DetectionResult};
use crate::frame::Frame;

/// Upper bound on scripted detections, summed over every label.
pub const MAX_STUB_DETECTIONS: usize = 10_000;

/// Scripted backend for tests and dry runs.
///
/// Returns the same configured detections for every frame, ignoring pixels.
/// A script is written as `label=count` pairs, e.g. `person=4,dog=1`.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    detections: Vec<Detection>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Build `count` detections per label, laid out on a grid so boxes do not
    /// overlap. The total may not exceed `MAX_STUB_DETECTIONS`.
    pub fn from_counts(counts: &[(&str, usize)]) -> Result<Self> {
        let total = counts
            .iter()
            .try_fold(0usize, |acc, (_, n)| acc.checked_add(*n))
            .filter(|total| *total <= MAX_STUB_DETECTIONS)
            .ok_or_else(|| {
                anyhow!(
                    "stub script asks for too many detections (limit {})",
                    MAX_STUB_DETECTIONS
                )
            })?;
        let cols = (total as f32).sqrt().ceil().max(1.0) as usize;
        let cell = 1.0 / cols as f32;
        let mut detections = Vec::with_capacity(total);
        for (label, count) in counts {
            for _ in 0..*count {
                let idx = detections.len();
                let bbox = BoundingBox {
                    x: (idx % cols) as f32 * cell,
                    y: (idx / cols) as f32 * cell,
                    w: cell * 0.8,
                    h: cell * 0.8,
                };
                // Stays in 0.55..=0.95 so the listing looks plausible.
                let confidence = 0.95 - (idx % 9) as f32 * 0.05;
                detections.push(Detection::new(*label, confidence, bbox));
            }
        }
        Ok(Self { detections })
    }
}

impl FromStr for StubBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (label, count) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("stub entry '{}' must look like label=count", entry))?;
            let label = label.trim();
            if label.is_empty() {
                return Err(anyhow!("stub entry '{}' has an empty label", entry));
            }
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| anyhow!("stub entry '{}' has an invalid count", entry))?;
            counts.push((label.to_string(), count));
        }
        let borrowed: Vec<(&str, usize)> = counts.iter().map(|(l, n)| (l.as_str(), *n)).collect();
        Self::from_counts(&borrowed)
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult> {
        Ok(DetectionResult::new(self.name(), self.detections.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from_rgb(vec![0; 12], 2, 2).unwrap()
    }

    #[test]
    fn empty_stub_detects_nothing() {
        let mut backend = StubBackend::new();
        assert!(backend.detect(&frame()).unwrap().is_empty());
    }

    #[test]
    fn parses_script() {
        let mut backend: StubBackend = "person=3, dog=1".parse().unwrap();
        let result = backend.detect(&frame()).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result.detections.iter().filter(|d| d.is_person()).count(), 3);
        assert!(result
            .detections
            .iter()
            .all(|d| (0.5..=0.95).contains(&d.confidence)));
    }

    #[test]
    fn rejects_bad_script() {
        assert!("person".parse::<StubBackend>().is_err());
        assert!("person=x".parse::<StubBackend>().is_err());
        assert!("=2".parse::<StubBackend>().is_err());
        assert!("".parse::<StubBackend>().unwrap().detections.is_empty());
    }

    #[test]
    fn oversized_script_is_an_error() {
        let err = "person=18446744073709551615,dog=1"
            .parse::<StubBackend>()
            .unwrap_err();
        assert!(err.to_string().contains("too many detections"), "{err}");

        let over = format!("person={}", MAX_STUB_DETECTIONS + 1);
        assert!(over.parse::<StubBackend>().is_err());
        let at_limit = format!("person={}", MAX_STUB_DETECTIONS);
        assert_eq!(
            at_limit.parse::<StubBackend>().unwrap().detections.len(),
            MAX_STUB_DETECTIONS
        );
    }

    #[test]
    fn explicit_detections_are_returned_as_given() {
        let bbox = BoundingBox {
            x: 0.1,
            y: 0.1,
            w: 0.2,
            h: 0.4,
        };
        let mut backend = StubBackend::with_detections(vec![
            Detection::new("person", 0.6, bbox),
            Detection::new("Person", 0.9, bbox),
        ]);
        let result = backend.detect(&frame()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.detections[0].label, "Person");
        assert_eq!(result.detections.iter().filter(|d| d.is_person()).count(), 1);
    }
}
