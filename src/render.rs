//! Console rendering of detections, decisions and reports.
//!
//! Every renderer returns a `String` so the binary decides where it goes and
//! tests can compare text.

use std::fmt::Write;

use crate::alert::{Classification, CrowdStatus};
use crate::pipeline::{Assessment, SecurityReport};
use crate::report::FailureKind;
use crate::scene::SceneSummary;

const HEAVY_RULE: &str = "==================================================";
const LIGHT_RULE: &str = "--------------------------------------------------";

fn status_icon(status: CrowdStatus) -> &'static str {
    match status {
        CrowdStatus::VeryCrowded => "🚨",
        CrowdStatus::Crowded => "⚠️ ",
        CrowdStatus::Normal => "✅",
        CrowdStatus::Empty => "📭",
    }
}

/// One line per detection: upper-cased label and confidence percentage.
pub fn detections(scene: &SceneSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DETECTIONS FOUND ({}):", scene.backend);
    let _ = writeln!(out, "{LIGHT_RULE}");
    for det in &scene.detections {
        let _ = writeln!(
            out,
            "✓ {:<15} | Confidence: {:.1}%",
            det.label.to_uppercase(),
            det.confidence * 100.0
        );
    }
    let _ = writeln!(out, "{LIGHT_RULE}");
    out
}

/// Person count, total objects and every label.
pub fn counts(scene: &SceneSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RESULTS:");
    let _ = writeln!(out, "{LIGHT_RULE}");
    let _ = writeln!(out, "👥 People detected: {}", scene.person_count);
    let _ = writeln!(out, "📦 Total objects found: {}", scene.total_objects);
    if scene.total_objects > 0 {
        let _ = writeln!(out, "\nAll objects:");
        for label in scene.labels() {
            let _ = writeln!(out, "   • {}", label);
        }
    }
    let _ = writeln!(out, "{LIGHT_RULE}");
    out
}

/// The decision block.
pub fn decision(classification: &Classification) -> String {
    let mut out = String::new();
    let status = classification.status();
    let _ = writeln!(out, "DECISION RESULTS:");
    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "👥 People Count: {}", classification.person_count());
    let _ = writeln!(out, "📊 Status: {} {}", status_icon(status), status);
    if let Some(level) = classification.alert_level() {
        let _ = writeln!(out, "🚨 Alert Level: {}", level);
    }
    if let Some(action) = classification.recommended_action() {
        let _ = writeln!(out, "📋 Recommended Action: {}", action);
    }
    let _ = writeln!(out, "{HEAVY_RULE}");
    out
}

/// Closing summary for an assessment.
pub fn summary(assessment: &Assessment) -> String {
    let mut out = decision(&assessment.classification);
    let _ = writeln!(out, "✅ Objects detected: {}", assessment.scene.total_objects);
    out
}

/// The generated report block.
pub fn report(report: &SecurityReport) -> String {
    let classification = &report.assessment.classification;
    let mut out = String::new();
    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "📊 SECURITY REPORT");
    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "👥 People Detected : {}", classification.person_count());
    let _ = writeln!(out, "📊 Area Status     : {}", classification.status());
    if let Some(level) = classification.alert_level() {
        let _ = writeln!(out, "🚨 Alert Level     : {}", level);
    }
    let _ = writeln!(
        out,
        "🤖 Model Used      : {} ({})",
        report.report.model, report.report.provider
    );
    let _ = writeln!(out, "\n📝 AI-Generated Report:");
    let _ = writeln!(out, "{LIGHT_RULE}");
    let _ = writeln!(out, "{}", report.report.text);
    let _ = writeln!(out, "{LIGHT_RULE}");
    out
}

/// Remediation hint for a provider failure.
pub fn failure_hint(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Unauthorized => "Invalid API key. Check the key for the selected provider.",
        FailureKind::RateLimited => "Rate limit exceeded. Wait a few moments and try again.",
        FailureKind::NoCredits => "No API credits available. Check the account billing page.",
        FailureKind::ModelUnavailable => {
            "None of the configured models is available. Set CROWD_MONITOR_MODELS."
        }
        FailureKind::Network => "Could not reach the provider. Check the network and base URL.",
        FailureKind::Other => "The provider returned an error. Try again, or use --provider offline.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{ClassificationMode, PersonCount};

    #[test]
    fn decision_block_lists_tiered_fields() {
        let outcome = ClassificationMode::Tiered.classify(PersonCount::new(11));
        let text = decision(&outcome);
        assert!(text.contains("People Count: 11"));
        assert!(text.contains("Status: 🚨 VERY CROWDED"));
        assert!(text.contains("Alert Level: CRITICAL"));
        assert!(text.contains("Recommended Action: Evacuate area immediately"));
    }

    #[test]
    fn legacy_decision_has_no_level() {
        let outcome = ClassificationMode::Legacy.classify(PersonCount::new(3));
        let text = decision(&outcome);
        assert!(text.contains("Status: ✅ NORMAL"));
        assert!(!text.contains("Alert Level"));
    }
}
