//! Detection, classification and reporting for one image.
//!
//! Stages run sequentially with no shared state between images:
//! 1. Detect objects with the registry's default backend
//! 2. Summarize the scene and count people
//! 3. Classify the count with the configured mode
//! 4. Optionally ask a `TextGenerator` for a narrative

use anyhow::{Context, Result};
use serde::Serialize;

use crate::alert::{Classification, ClassificationMode};
use crate::config::DetectorSettings;
use crate::detect::{BackendRegistry, StubBackend};
use crate::frame::Frame;
use crate::report::{build_prompt, Generated, ReportFacts, TextGenerator};
use crate::scene::SceneSummary;

/// Detection summary plus classification for one image.
#[derive(Clone, Debug, Serialize)]
pub struct Assessment {
    pub scene: SceneSummary,
    pub classification: Classification,
}

/// An assessment with its generated narrative.
#[derive(Clone, Debug, Serialize)]
pub struct SecurityReport {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub report: Generated,
}

pub struct Monitor {
    registry: BackendRegistry,
    mode: ClassificationMode,
}

impl Monitor {
    pub fn new(registry: BackendRegistry, mode: ClassificationMode) -> Self {
        Self { registry, mode }
    }

    /// Build a monitor with the backend named in `settings`.
    pub fn from_settings(settings: &DetectorSettings, mode: ClassificationMode) -> Result<Self> {
        let mut registry = BackendRegistry::new();
        let stub: StubBackend = if settings.backend == "stub" {
            settings
                .stub_detections
                .parse()
                .context("invalid stub detection script")?
        } else {
            StubBackend::new()
        };
        registry.register(stub);
        register_tract(&mut registry, settings)?;
        registry.set_default(&settings.backend)?;
        log::info!(
            "detector backends: {} (default {})",
            registry.list().join(", "),
            settings.backend
        );
        Ok(Self::new(registry, mode))
    }

    pub fn warm_up(&self) -> Result<()> {
        self.registry.warm_up()
    }

    /// Detect and summarize without classifying.
    pub fn survey(&self, frame: &Frame) -> Result<SceneSummary> {
        let result = self.registry.detect(frame).context("object detection failed")?;
        log::debug!("{} detections from {}", result.len(), result.backend);
        SceneSummary::from_result(result)
    }

    pub fn analyze(&self, frame: &Frame) -> Result<Assessment> {
        let scene = self.survey(frame)?;
        let classification = self.mode.classify(scene.person_count);
        log::info!(
            "people={} status={} mode={}",
            scene.person_count,
            classification.status(),
            self.mode.as_str()
        );
        Ok(Assessment {
            scene,
            classification,
        })
    }
}

impl Assessment {
    pub fn facts(&self) -> ReportFacts {
        ReportFacts::from(&self.classification)
    }

    pub fn prompt(&self) -> String {
        build_prompt(&self.facts())
    }

    /// Ask `generator` for the narrative.
    pub fn report(self, generator: &dyn TextGenerator) -> Result<SecurityReport> {
        let prompt = self.prompt();
        let report = generator
            .generate(&prompt)
            .with_context(|| format!("{} could not write the report", generator.name()))?;
        Ok(SecurityReport {
            assessment: self,
            report,
        })
    }
}

#[cfg(feature = "backend-tract")]
fn register_tract(registry: &mut BackendRegistry, settings: &DetectorSettings) -> Result<()> {
    if settings.backend != "tract" {
        return Ok(());
    }
    let backend = crate::detect::TractBackend::new(&settings.model_path, settings.params)?;
    registry.register(backend);
    Ok(())
}

#[cfg(not(feature = "backend-tract"))]
fn register_tract(_registry: &mut BackendRegistry, settings: &DetectorSettings) -> Result<()> {
    if settings.backend == "tract" {
        return Err(anyhow::anyhow!(
            "the tract backend requires the backend-tract feature"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertLevel;
    use crate::config::MonitorConfig;
    use crate::report::OfflineGenerator;

    fn monitor(script: &str, mode: ClassificationMode) -> Monitor {
        let mut settings = MonitorConfig::default().detector;
        settings.stub_detections = script.to_string();
        Monitor::from_settings(&settings, mode).unwrap()
    }

    fn frame() -> Frame {
        Frame::from_rgb(vec![0; 48], 4, 4).unwrap()
    }

    #[test]
    fn analyze_counts_people_and_classifies() {
        let assessment = monitor("person=6,car=2", ClassificationMode::Tiered)
            .analyze(&frame())
            .unwrap();
        assert_eq!(assessment.scene.person_count.get(), 6);
        assert_eq!(assessment.scene.total_objects, 8);
        assert_eq!(assessment.classification.alert_level(), Some(AlertLevel::High));
    }

    #[test]
    fn report_uses_generator() {
        let report = monitor("person=1", ClassificationMode::Tiered)
            .analyze(&frame())
            .unwrap()
            .report(&OfflineGenerator::new())
            .unwrap();
        assert!(report.report.text.contains("1 person"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["classification"]["alert_level"], "NONE");
        assert_eq!(json["report"]["provider"], "offline");
    }

    #[test]
    fn stub_script_is_ignored_for_other_backends() {
        let mut settings = MonitorConfig::default().detector;
        settings.stub_detections = "person=not-a-number".into();
        assert!(Monitor::from_settings(&settings, ClassificationMode::Tiered).is_err());

        settings.backend = "tract".into();
        let err = Monitor::from_settings(&settings, ClassificationMode::Tiered)
            .err()
            .map(|e| format!("{e:#}"))
            .unwrap_or_default();
        assert!(!err.contains("stub detection script"), "{err}");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut settings = MonitorConfig::default().detector;
        settings.backend = "missing".into();
        assert!(Monitor::from_settings(&settings, ClassificationMode::Tiered).is_err());
    }
}
