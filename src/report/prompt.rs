//! Report prompt.
//!
//! The prompt carries the classification as an INFORMATION block of
//! `- Key: value` lines followed by a fixed TASK. Tiered classifications
//! include alert level and recommended action; legacy ones only count and
//! status.

use serde::Serialize;

use crate::alert::{AlertLevel, Classification, CrowdStatus, PersonCount};

pub const PEOPLE_KEY: &str = "People detected";
pub const STATUS_KEY: &str = "Status";
pub const LEVEL_KEY: &str = "Alert Level";
pub const ACTION_KEY: &str = "Recommended Action";

const PERSONA: &str = "You are a friendly security report writer.";
const TASK: &str = "TASK: Write a SHORT, friendly report (exactly 3 sentences) about this situation.\n\
Write like you're talking to a 10-year-old. Keep it simple, calm, and helpful!";

/// Facts a report is written from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportFacts {
    pub person_count: PersonCount,
    pub status: CrowdStatus,
    pub alert_level: Option<AlertLevel>,
    pub recommended_action: Option<&'static str>,
}

impl From<&Classification> for ReportFacts {
    fn from(classification: &Classification) -> Self {
        Self {
            person_count: classification.person_count(),
            status: classification.status(),
            alert_level: classification.alert_level(),
            recommended_action: classification.recommended_action(),
        }
    }
}

impl ReportFacts {
    fn information_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("- {}: {}", PEOPLE_KEY, self.person_count),
            format!("- {}: {}", STATUS_KEY, self.status),
        ];
        if let Some(level) = self.alert_level {
            lines.push(format!("- {}: {}", LEVEL_KEY, level));
        }
        if let Some(action) = self.recommended_action {
            lines.push(format!("- {}: {}", ACTION_KEY, action));
        }
        lines
    }
}

pub fn build_prompt(facts: &ReportFacts) -> String {
    format!(
        "{}\n\nINFORMATION:\n{}\n\n{}\n",
        PERSONA,
        facts.information_lines().join("\n"),
        TASK
    )
}

/// Value of a `- Key: value` line in a prompt, if present.
pub fn information_value<'a>(prompt: &'a str, key: &str) -> Option<&'a str> {
    prompt.lines().find_map(|line| {
        line.trim()
            .strip_prefix("- ")
            .and_then(|rest| rest.strip_prefix(key))
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::ClassificationMode;

    #[test]
    fn tiered_prompt_lists_all_facts() {
        let outcome = ClassificationMode::Tiered.classify(PersonCount::new(7));
        let prompt = build_prompt(&ReportFacts::from(&outcome));
        assert!(prompt.starts_with(PERSONA));
        assert!(prompt.contains("- People detected: 7"));
        assert!(prompt.contains("- Status: CROWDED"));
        assert!(prompt.contains("- Alert Level: HIGH"));
        assert!(prompt.contains("- Recommended Action: Monitor area carefully"));
        assert!(prompt.contains("exactly 3 sentences"));
    }

    #[test]
    fn legacy_prompt_omits_level_and_action() {
        let outcome = ClassificationMode::Legacy.classify(PersonCount::new(7));
        let prompt = build_prompt(&ReportFacts::from(&outcome));
        assert!(prompt.contains("- Status: CROWDED"));
        assert!(!prompt.contains(LEVEL_KEY));
        assert!(!prompt.contains(ACTION_KEY));
    }

    #[test]
    fn reads_values_back() {
        let outcome = ClassificationMode::Tiered.classify(PersonCount::new(12));
        let prompt = build_prompt(&ReportFacts::from(&outcome));
        assert_eq!(information_value(&prompt, PEOPLE_KEY), Some("12"));
        assert_eq!(information_value(&prompt, STATUS_KEY), Some("VERY CROWDED"));
        assert_eq!(information_value("Say hello!", STATUS_KEY), None);
    }
}
