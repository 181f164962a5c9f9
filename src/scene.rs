//! Scene summaries built from detector output.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alert::PersonCount;
use crate::detect::{Detection, DetectionResult};

/// Count detections whose label is exactly `"person"`.
pub fn count_persons(detections: &[Detection]) -> Result<PersonCount> {
    PersonCount::try_from(detections.iter().filter(|d| d.is_person()).count())
}

/// What was seen in one image.
#[derive(Clone, Debug, Serialize)]
pub struct SceneSummary {
    pub backend: String,
    pub person_count: PersonCount,
    pub total_objects: usize,
    /// Every detection, highest confidence first.
    pub detections: Vec<Detection>,
    /// Detections per label.
    pub tallies: BTreeMap<String, usize>,
}

impl SceneSummary {
    pub fn from_result(result: DetectionResult) -> Result<Self> {
        let person_count = count_persons(&result.detections)?;
        let mut tallies = BTreeMap::new();
        for det in &result.detections {
            *tallies.entry(det.label.clone()).or_insert(0) += 1;
        }
        Ok(Self {
            backend: result.backend,
            person_count,
            total_objects: result.detections.len(),
            detections: result.detections,
            tallies,
        })
    }

    /// Labels in detection order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.detections.iter().map(|d| d.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::default())
    }

    #[test]
    fn counts_only_exact_person_labels() {
        let dets = vec![
            det("person", 0.9),
            det("person", 0.4),
            det("PERSON", 0.8),
            det("car", 0.7),
        ];
        assert_eq!(count_persons(&dets).unwrap().get(), 2);
        assert_eq!(count_persons(&[]).unwrap().get(), 0);
    }

    #[test]
    fn summary_tallies_labels() {
        let result = DetectionResult::new(
            "stub",
            vec![det("dog", 0.5), det("person", 0.9), det("person", 0.7)],
        );
        let summary = SceneSummary::from_result(result).unwrap();
        assert_eq!(summary.person_count.get(), 2);
        assert_eq!(summary.total_objects, 3);
        assert_eq!(summary.tallies["person"], 2);
        assert_eq!(summary.tallies["dog"], 1);
        assert_eq!(
            summary.labels().collect::<Vec<_>>(),
            vec!["person", "person", "dog"]
        );
    }
}
